use std::fmt;
use std::path::PathBuf;

/// Why a registration call added nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Inactive { capability: String },
    MissingCommand { capability: String, program: String },
    MissingFile { capability: String, path: PathBuf },
    EmptyCommand { capability: String },
    InvalidPattern { pattern: String, error: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Inactive { capability } => {
                write!(f, "capability {} is not active", capability)
            }
            SkipReason::MissingCommand {
                capability,
                program,
            } => write!(f, "{} command not found: {}", capability, program),
            SkipReason::MissingFile { capability, path } => {
                write!(f, "{} file not found: {}", capability, path.display())
            }
            SkipReason::EmptyCommand { capability } => {
                write!(f, "{} command is empty", capability)
            }
            SkipReason::InvalidPattern { pattern, error } => {
                write!(f, "invalid pattern {}: {}", pattern, error)
            }
        }
    }
}

/// Result of a single registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered(String),
    /// An earlier task with the same label was overwritten
    Replaced(String),
    Skipped(SkipReason),
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        !matches!(self, RegistrationOutcome::Skipped(_))
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            RegistrationOutcome::Registered(label) | RegistrationOutcome::Replaced(label) => {
                Some(label)
            }
            RegistrationOutcome::Skipped(_) => None,
        }
    }
}
