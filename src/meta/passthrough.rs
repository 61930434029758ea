//! Unvalidated properties.
//!
//! `passthrough` copies keys into snap.yaml as written, at top level, per app
//! and per hook. A key may not also be declared at the same level.

use std::collections::BTreeSet;

use serde_yaml::{Mapping, Value};

use crate::meta::errors::{quote_keys, MetaError};
use crate::meta::notices::Notices;

pub const PASSTHROUGH_NOTICE: &str = "The 'passthrough' property is being used to propagate experimental properties to snap.yaml that have not been validated.";

/// Which part of the document a passthrough block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    TopLevel,
    App(&'a str),
    Hook(&'a str),
}

impl std::fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::TopLevel => write!(f, "the top-level configuration"),
            Scope::App(name) => write!(f, "app {:?}", name),
            Scope::Hook(name) => write!(f, "hook {:?}", name),
        }
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Set every passthrough entry on `target`.
///
/// Existing keys keep their position and take the passthrough value; new keys
/// are appended.
pub fn merge(
    target: &mut Mapping,
    passthrough: Option<&Mapping>,
    declared: &BTreeSet<&str>,
    scope: Scope<'_>,
    notices: &mut Notices,
) -> Result<(), MetaError> {
    let Some(passthrough) = passthrough.filter(|p| !p.is_empty()) else {
        return Ok(());
    };

    let mut duplicates: Vec<String> = passthrough
        .keys()
        .map(key_name)
        .filter(|k| declared.contains(k.as_str()))
        .collect();
    if !duplicates.is_empty() {
        duplicates.sort();
        return Err(MetaError::AmbiguousPassthroughKey {
            scope: scope.to_string(),
            keys: quote_keys(&duplicates),
        });
    }

    notices.info_once("passthrough", PASSTHROUGH_NOTICE);

    for (key, value) in passthrough {
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}

/// Whether `key` is present in the passthrough block.
pub fn provides(passthrough: Option<&Mapping>, key: &str) -> bool {
    passthrough.is_some_and(|p| p.contains_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[traced_test]
    #[test]
    fn test_merge_sets_values_verbatim() {
        let mut target = mapping("name: x\narchitectures: [amd64]\n");
        let pt = mapping("architectures: all\nfoo: {bar: [1, 2]}\n");
        let mut notices = Notices::new();

        merge(&mut target, Some(&pt), &BTreeSet::from(["name"]), Scope::TopLevel, &mut notices)
            .unwrap();

        let keys: Vec<_> = target.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["name", "architectures", "foo"]);
        assert_eq!(target["architectures"], Value::String("all".into()));
        assert_eq!(target["foo"], Value::Mapping(mapping("bar: [1, 2]\n")));
        assert!(logs_contain("propagate experimental properties"));
    }

    #[test]
    fn test_declared_key_is_ambiguous() {
        let mut target = Mapping::new();
        let pt = mapping("confinement: devmode\ngrade: devel\n");
        let declared = BTreeSet::from(["name", "grade", "confinement"]);

        let err = merge(&mut target, Some(&pt), &declared, Scope::App("app1"), &mut Notices::new())
            .unwrap_err();

        match err {
            MetaError::AmbiguousPassthroughKey { scope, keys } => {
                assert_eq!(keys, "'confinement', 'grade'");
                assert_eq!(scope, "app \"app1\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_notice_once_per_run() {
        let mut notices = Notices::new();
        let pt = mapping("a: 1\n");
        for scope in [Scope::TopLevel, Scope::App("x"), Scope::Hook("y")] {
            merge(&mut Mapping::new(), Some(&pt), &BTreeSet::new(), scope, &mut notices).unwrap();
        }

        assert_eq!(notices.count_containing("'passthrough' property"), 1);
    }

    #[test]
    fn test_empty_passthrough_is_silent() {
        let mut notices = Notices::new();
        merge(&mut Mapping::new(), Some(&Mapping::new()), &BTreeSet::new(), Scope::TopLevel, &mut notices)
            .unwrap();
        merge(&mut Mapping::new(), None, &BTreeSet::new(), Scope::TopLevel, &mut notices).unwrap();

        assert!(notices.is_empty());
    }
}
