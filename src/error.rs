//! Error types for the progression engine.
//!
//! A single aggregate error wraps the domain-specific hierarchies so the
//! binary can map any failure to a stable exit code, while library callers
//! match on the domain variants they care about.

use thiserror::Error;

use crate::profile::{BehaviorType, CharacterId};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for the `progression` CLI.
///
/// These codes follow Unix conventions; anything above 64 is reserved for
/// usage and signal handling.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Profile store error (missing profile, contention, corrupt history)
    pub const PROFILE_ERROR: i32 = 4;

    /// Phase policy error (unknown behavior, missing phase table)
    pub const PHASE_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for progression engine operations.
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Trigger detector error
    #[error(transparent)]
    Detector(#[from] DetectorError),

    /// Profile store error
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Phase policy error
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProgressionError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Detector(_) => ExitCode::ERROR,
            Self::Profile(_) => ExitCode::PROFILE_ERROR,
            Self::Phase(_) => ExitCode::PHASE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: String,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {} error(s)", errors.len())]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: String,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Configuration file exceeds the size limit
    #[error("configuration too large: {path} is {size} bytes (limit: {limit})")]
    TooLarge {
        /// Path to the configuration file
        path: String,
        /// Actual file size in bytes
        size: u64,
        /// Configured size limit in bytes
        limit: u64,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g. `triggers.criticism.weight`)
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Validation failure that prevents the configuration from being used
    Error,
    /// Potential issue that does not prevent loading
    Warning,
}

// ============================================================================
// Detector Errors
// ============================================================================

/// Trigger detector construction errors.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// A configured pattern failed to compile
    #[error("invalid pattern for trigger '{kind}': {message}")]
    InvalidPattern {
        /// Trigger kind the pattern belongs to
        kind: String,
        /// Error message from the regex compiler
        message: String,
    },
}

// ============================================================================
// Profile Store Errors
// ============================================================================

/// Behavior profile store errors.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No profile exists for the (character, behavior type) key
    #[error("no profile for character '{character}' behavior {behavior_type}")]
    NotFound {
        /// Character the lookup targeted
        character: CharacterId,
        /// Behavior type the lookup targeted
        behavior_type: BehaviorType,
    },

    /// Activation requested for an already-active profile
    #[error("profile already active for character '{character}' behavior {behavior_type}")]
    AlreadyActive {
        /// Character the activation targeted
        character: CharacterId,
        /// Behavior type the activation targeted
        behavior_type: BehaviorType,
    },

    /// Bounded retry on a contended character entry was exhausted.
    ///
    /// Transient: the update was not applied and no partial write is
    /// visible. Callers may retry the whole interaction.
    #[error("profiles contended for character '{character}' after {attempts} attempts")]
    Contended {
        /// Character whose profiles were contended
        character: CharacterId,
        /// Number of acquisition attempts made
        attempts: u32,
    },

    /// Phase history failed its integrity check.
    ///
    /// Phase history is the audit trail for safety escalation, so this is
    /// surfaced as an unrecoverable fault for the profile rather than
    /// repaired in place.
    #[error(
        "corrupt phase history for character '{character}' behavior {behavior_type}: {detail}"
    )]
    CorruptHistory {
        /// Character whose profile is corrupt
        character: CharacterId,
        /// Behavior type whose profile is corrupt
        behavior_type: BehaviorType,
        /// Description of the integrity violation
        detail: String,
    },
}

// ============================================================================
// Phase Policy Errors
// ============================================================================

/// Phase transition policy errors.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// No phase table is configured for the behavior type
    #[error("no phase table configured for behavior {0}")]
    NoPhaseTable(BehaviorType),

    /// A profile references a phase outside its configured table
    #[error("phase {phase} out of range for behavior {behavior_type} (max {max_phase})")]
    PhaseOutOfRange {
        /// Behavior type being evaluated
        behavior_type: BehaviorType,
        /// Phase the profile claims to occupy
        phase: u32,
        /// Highest phase the table defines
        max_phase: u32,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for progression engine operations.
pub type Result<T> = std::result::Result<T, ProgressionError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::PROFILE_ERROR, 4);
        assert_eq!(ExitCode::PHASE_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_profile_error_exit_code() {
        let err: ProgressionError = ProfileError::NotFound {
            character: CharacterId::new("c1"),
            behavior_type: BehaviorType::YandereObsessive,
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::PROFILE_ERROR);
    }

    #[test]
    fn test_phase_error_exit_code() {
        let err: ProgressionError =
            PhaseError::NoPhaseTable(BehaviorType::Codependency).into();
        assert_eq!(err.exit_code(), ExitCode::PHASE_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: ProgressionError = ConfigError::MissingFile {
            path: "/missing.yaml".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: ProgressionError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "triggers.criticism.weight".to_string(),
            message: "weight outside [0, 1]".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: weight outside [0, 1] at triggers.criticism.weight"
        );
    }

    #[test]
    fn test_validation_issue_warning_display() {
        let issue = ValidationIssue {
            path: "behaviors.YANDERE_OBSESSIVE.defaults".to_string(),
            message: "volatility is zero; profile will never move".to_string(),
            severity: Severity::Warning,
        };
        assert!(issue.to_string().starts_with("warning: "));
    }

    #[test]
    fn test_contended_error_display() {
        let err = ProfileError::Contended {
            character: CharacterId::new("alice"),
            attempts: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("alice"));
        assert!(msg.contains("8 attempts"));
    }
}
