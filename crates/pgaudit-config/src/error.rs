use thiserror::Error;

/// Errors that can occur while loading an audit configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Setting '{0}' appears before any section header")]
    OutsideSection(String),

    #[error("Unknown section '[{0}]'")]
    UnknownSection(String),

    #[error("Unknown setting '{key}' in [{section}] section")]
    UnknownSetting { section: String, key: String },

    #[error("Operator '!=' is only allowed in [rule] sections (setting '{0}')")]
    NegationNotAllowed(String),

    #[error("Field '{0}' is set more than once in the same [rule] section")]
    DuplicateField(String),

    #[error("Invalid class '{0}'")]
    InvalidClass(String),

    #[error("Invalid object type '{0}'")]
    InvalidObjectType(String),

    #[error("Invalid time of day '{0}' (expected HH:MM:SS)")]
    InvalidTime(String),

    #[error("Invalid time range '{0}'")]
    InvalidTimeRange(String),

    #[error("Invalid integer '{0}'")]
    InvalidInteger(String),

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("Invalid logger '{0}'")]
    InvalidLogger(String),

    #[error("Unknown placeholder '%{0}%' in format directive")]
    UnknownPlaceholder(String),

    #[error("Unterminated placeholder in format directive '{0}'")]
    UnterminatedPlaceholder(String),

    #[error("Field '{field}' expects {expected} values")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field '{0}' has an empty value list")]
    EmptyValue(String),

    #[error("Invalid output configuration: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
