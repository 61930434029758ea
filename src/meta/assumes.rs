//! The `assumes` list of snap.yaml.

use std::collections::BTreeSet;

use serde_yaml::{Mapping, Value};

/// A snapd feature the generated document relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Requirement {
    /// Some app or hook has a non-empty `command-chain`
    CommandChain,
}

impl Requirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Requirement::CommandChain => "command-chain",
        }
    }
}

/// Requirements implied by the final `apps` and `hooks` sections.
pub fn structural_requirements(apps: &Mapping, hooks: &Mapping) -> BTreeSet<Requirement> {
    let uses_chain = apps
        .values()
        .chain(hooks.values())
        .filter_map(Value::as_mapping)
        .any(|entry| {
            entry
                .get("command-chain")
                .and_then(Value::as_sequence)
                .is_some_and(|chain| !chain.is_empty())
        });

    let mut requirements = BTreeSet::new();
    if uses_chain {
        requirements.insert(Requirement::CommandChain);
    }
    requirements
}

/// Structural requirements first, then declared assumes, without duplicates.
pub fn collect(declared: &[String], structural: &BTreeSet<Requirement>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let all = structural
        .iter()
        .map(|r| r.as_str().to_string())
        .chain(declared.iter().cloned());
    for feature in all {
        if !out.contains(&feature) {
            out.push(feature);
        }
    }
    out
}
