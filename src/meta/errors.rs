//! Fatal packaging errors.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Everything that stops snap.yaml from being written.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum MetaError {
    #[error("missing required snap.yaml keys: {keys}; either specify them in snapcraft.yaml or adopt them from a part")]
    #[diagnostic(code(snapsmith::meta::missing_required_field))]
    MissingRequiredField { keys: String },

    #[error("invalid {field} {value:?}: {expected}")]
    #[diagnostic(code(snapsmith::meta::invalid_field_format))]
    InvalidFieldFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("'adopt-info' refers to part {part:?}, but that part is not defined")]
    #[diagnostic(code(snapsmith::meta::adopted_part_missing))]
    AdoptedPartMissing { part: String },

    #[error("'adopt-info' refers to part {part:?}, but that part lacks 'parse-info' and sets no metadata")]
    #[diagnostic(code(snapsmith::meta::adopted_part_not_parsing_info))]
    AdoptedPartNotParsingInfo { part: String },

    #[error("{owner} refers to {path:?}, which does not exist")]
    #[diagnostic(code(snapsmith::meta::missing_asset))]
    MissingAsset { owner: String, path: PathBuf },

    #[error("invalid desktop file {path:?}: {message}")]
    #[diagnostic(code(snapsmith::meta::invalid_desktop_file))]
    InvalidDesktopFile { path: PathBuf, message: String },

    #[error("the following keys are specified in both {scope} and its passthrough: {keys}")]
    #[diagnostic(code(snapsmith::meta::ambiguous_passthrough_key))]
    AmbiguousPassthroughKey { scope: String, keys: String },

    #[error("the command {command:?} for app {app:?} has an invalid format")]
    #[diagnostic(
        code(snapsmith::meta::invalid_command_format),
        help("commands must be relative to the prime directory and must not contain single quotes")
    )]
    InvalidCommandFormat { app: String, command: String },

    #[error("failed to resolve the command {command:?} for app {app:?}: not found in the prime directory or on PATH")]
    #[diagnostic(code(snapsmith::meta::command_not_found))]
    CommandNotFound { app: String, command: String },

    #[error("the command {command:?} for app {app:?} is not executable")]
    #[diagnostic(code(snapsmith::meta::command_not_executable))]
    CommandNotExecutable { app: String, command: String },

    #[error("failed to find entry {item:?} in the command-chain of app {app:?}")]
    #[diagnostic(code(snapsmith::meta::invalid_command_chain_entry))]
    InvalidCommandChainEntry { app: String, item: String },

    #[error("the gadget snap {package:?} needs a gadget.yaml")]
    #[diagnostic(code(snapsmith::meta::missing_gadget_descriptor))]
    MissingGadgetDescriptor { package: String },

    #[error("`{command}` failed: {message}")]
    #[diagnostic(code(snapsmith::meta::external_command_failure))]
    ExternalCommandFailure { command: String, message: String },

    #[error("{message}")]
    #[diagnostic(code(snapsmith::meta::io))]
    Io { message: String },
}

impl From<anyhow::Error> for MetaError {
    fn from(err: anyhow::Error) -> Self {
        MetaError::Io {
            message: format!("{:#}", err),
        }
    }
}

impl From<std::io::Error> for MetaError {
    fn from(err: std::io::Error) -> Self {
        MetaError::Io {
            message: err.to_string(),
        }
    }
}

impl MetaError {
    /// Convert to a human-readable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            MetaError::MissingRequiredField { .. } => {
                diag.with_suggestion(suggestions::MISSING_FIELD)
            }
            MetaError::AdoptedPartNotParsingInfo { .. } => {
                diag.with_suggestion(suggestions::ADD_PARSE_INFO)
            }
            MetaError::MissingAsset { path, .. } => diag
                .with_location(path.clone())
                .with_suggestion(suggestions::CHECK_ASSET_PATH),
            MetaError::InvalidDesktopFile { path, .. } => diag.with_location(path.clone()),
            MetaError::AmbiguousPassthroughKey { .. } => {
                diag.with_suggestion(suggestions::PASSTHROUGH_DUPLICATE)
            }
            MetaError::InvalidCommandFormat { .. }
            | MetaError::CommandNotFound { .. }
            | MetaError::InvalidCommandChainEntry { .. } => {
                diag.with_suggestion(suggestions::COMMAND_RELATIVE)
            }
            MetaError::CommandNotExecutable { .. } => {
                diag.with_suggestion(suggestions::COMMAND_CHMOD)
            }
            MetaError::MissingGadgetDescriptor { .. } => {
                diag.with_suggestion(suggestions::ADD_GADGET_YAML)
            }
            MetaError::InvalidFieldFormat { .. }
            | MetaError::AdoptedPartMissing { .. }
            | MetaError::ExternalCommandFailure { .. }
            | MetaError::Io { .. } => diag,
        }
    }
}

/// Quote and join names for messages: `'a', 'b'`.
pub fn quote_keys<I, S>(keys: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .map(|k| format!("'{}'", k.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
