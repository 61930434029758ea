//! User-friendly diagnostic messages.
//!
//! Every fatal packaging error is rendered with the entity at fault and,
//! where one exists, a concrete fix.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no project description is found.
    pub const NO_PROJECT_FILE: &str =
        "help: Create snap/snapcraft.yaml or run snapsmith from the project directory";

    /// Suggestion when a required metadata field is missing.
    pub const MISSING_FIELD: &str =
        "help: Declare the field in snapcraft.yaml or adopt it from a part with `adopt-info`";

    /// Suggestion when the adopted part does not parse any metadata.
    pub const ADD_PARSE_INFO: &str =
        "help: List metadata files under the part's `parse-info` key";

    /// Suggestion when a command cannot be resolved.
    pub const COMMAND_RELATIVE: &str =
        "help: Commands are relative to the prime directory; check the part installs it";

    /// Suggestion when a command is not executable.
    pub const COMMAND_CHMOD: &str = "help: Make the file executable in the part's install step";

    /// Suggestion when a passthrough key duplicates a declared key.
    pub const PASSTHROUGH_DUPLICATE: &str =
        "help: Remove the key either from passthrough or from the regular declaration";

    /// Suggestion when an asset path does not exist.
    pub const CHECK_ASSET_PATH: &str = "help: Check the path exists in the project or prime tree";

    /// Suggestion when a gadget snap has no gadget.yaml.
    pub const ADD_GADGET_YAML: &str =
        "help: Add gadget.yaml next to snapcraft.yaml or at the project root";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        for suggestion in &self.suggestions {
            output.push_str(&format!("  {}\n", suggestion));
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
