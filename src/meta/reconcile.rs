//! Declared versus extracted metadata.
//!
//! What the project declares always wins. Extracted values fill the gaps,
//! and every field both sources set is reported in a single warning.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::core::metadata::ExtractedMetadata;
use crate::core::project::ProjectConfig;
use crate::core::validation::{is_valid_version, Confinement, Grade};
use crate::meta::errors::{quote_keys, MetaError};
use crate::meta::notices::Notices;
use crate::util::process::ProcessBuilder;

const REQUIRED: [&str; 3] = ["description", "summary", "version"];

/// Metadata after merging both sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledMetadata {
    pub version: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub grade: Option<String>,
    pub license: Option<String>,
    /// Extracted icon, only set when the project declares none
    pub icon: Option<String>,
    pub desktop_file_paths: Vec<String>,
    pub common_id: Option<String>,
    /// Extracted keys the project does not declare
    pub custom: Mapping,
}

/// Run `version-script` and return its trimmed output.
pub fn run_version_script(
    script: &str,
    project: &ProjectConfig,
    project_dir: &Path,
) -> Result<String, MetaError> {
    let pb = ProcessBuilder::shell(script)
        .cwd(project_dir)
        .env("SNAPCRAFT_PROJECT_NAME", &project.name)
        .env("SNAPCRAFT_PROJECT_DIR", project_dir.to_string_lossy());
    let failure = |message: String| MetaError::ExternalCommandFailure {
        command: pb.display_command(),
        message,
    };

    let output = pb.exec().map_err(|e| failure(format!("{:#}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failure(format!("exited with {}: {}", output.status, stderr.trim())));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        return Err(failure("printed no version".to_string()));
    }
    tracing::debug!("version-script produced {}", version);
    Ok(version)
}

fn pick(
    field: &'static str,
    declared: Option<&String>,
    extracted: Option<&String>,
    conflicts: &mut Vec<&'static str>,
) -> Option<String> {
    match (declared, extracted) {
        (Some(d), Some(_)) => {
            conflicts.push(field);
            Some(d.clone())
        }
        (Some(d), None) => Some(d.clone()),
        (None, e) => e.cloned(),
    }
}

fn conflict_message(conflicts: &[&str]) -> String {
    let (noun, verb) = if conflicts.len() == 1 {
        ("property", "is")
    } else {
        ("properties", "are")
    };
    format!(
        "The {} {} {} specified in adopted info as well as the project configuration: taking the {} from the project configuration",
        quote_keys(conflicts),
        noun,
        verb,
        noun
    )
}

/// Merge declared and extracted metadata and validate the result.
pub fn reconcile(
    project: &ProjectConfig,
    extracted: &ExtractedMetadata,
    project_dir: &Path,
    notices: &mut Notices,
) -> Result<ReconciledMetadata, MetaError> {
    let adopted_part = match project.adopt_info.as_deref() {
        Some(name) => match project.parts.get(name) {
            Some(part) => Some((name, part)),
            None => {
                return Err(MetaError::AdoptedPartMissing {
                    part: name.to_string(),
                })
            }
        },
        None => None,
    };

    let declared_version = match &project.version_script {
        Some(script) => Some(run_version_script(script, project, project_dir)?),
        None => project.version.clone(),
    };

    let mut conflicts = Vec::new();
    let mut out = ReconciledMetadata {
        version: pick(
            "version",
            declared_version.as_ref(),
            extracted.version.as_ref(),
            &mut conflicts,
        ),
        summary: pick(
            "summary",
            project.summary.as_ref(),
            extracted.summary.as_ref(),
            &mut conflicts,
        ),
        description: pick(
            "description",
            project.description.as_ref(),
            extracted.description.as_ref(),
            &mut conflicts,
        ),
        grade: pick(
            "grade",
            project.grade.as_ref(),
            extracted.grade.as_ref(),
            &mut conflicts,
        ),
        license: pick(
            "license",
            project.license.as_ref(),
            extracted.license.as_ref(),
            &mut conflicts,
        ),
        icon: None,
        desktop_file_paths: extracted.desktop_file_paths.clone(),
        common_id: extracted.common_id.clone(),
        custom: Mapping::new(),
    };

    match (&project.icon, &extracted.icon) {
        (Some(_), Some(_)) => conflicts.push("icon"),
        (None, Some(icon)) => out.icon = Some(icon.clone()),
        _ => {}
    }

    let declared_keys = project.declared_keys();
    for (key, value) in &extracted.custom {
        if declared_keys.contains(key.as_str()) {
            conflicts.push(custom_key_name(key, &declared_keys));
        } else {
            out.custom.insert(Value::String(key.clone()), value.clone());
        }
    }

    if !conflicts.is_empty() {
        conflicts.sort();
        conflicts.dedup();
        notices.warn_once("metadata-conflict", conflict_message(&conflicts));
    }

    let missing: Vec<&str> = REQUIRED
        .iter()
        .copied()
        .filter(|key| match *key {
            "description" => out.description.is_none(),
            "summary" => out.summary.is_none(),
            _ => out.version.is_none(),
        })
        .collect();
    if !missing.is_empty() {
        if let Some((part, spec)) = adopted_part {
            if spec.parse_info.is_empty() && extracted.is_empty() {
                return Err(MetaError::AdoptedPartNotParsingInfo {
                    part: part.to_string(),
                });
            }
        }
        return Err(MetaError::MissingRequiredField {
            keys: quote_keys(&missing),
        });
    }

    validate(&out, project)?;
    Ok(out)
}

fn custom_key_name(key: &str, declared: &std::collections::BTreeSet<&'static str>) -> &'static str {
    declared.get(key).copied().unwrap_or("custom")
}

fn validate(meta: &ReconciledMetadata, project: &ProjectConfig) -> Result<(), MetaError> {
    if let Some(version) = &meta.version {
        if !is_valid_version(version) {
            return Err(MetaError::InvalidFieldFormat {
                field: "version",
                value: version.clone(),
                expected: "up to 32 letters, digits and the characters :.+~- \
                           starting and ending with a letter, digit, + or ~",
            });
        }
    }
    if let Some(grade) = &meta.grade {
        if grade.parse::<Grade>().is_err() {
            return Err(MetaError::InvalidFieldFormat {
                field: "grade",
                value: grade.clone(),
                expected: "one of stable, candidate, beta, devel",
            });
        }
    }
    if let Some(confinement) = &project.confinement {
        if confinement.parse::<Confinement>().is_err() {
            return Err(MetaError::InvalidFieldFormat {
                field: "confinement",
                value: confinement.clone(),
                expected: "one of strict, devmode, classic",
            });
        }
    }
    Ok(())
}
