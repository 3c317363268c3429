//! Error types for Cadence

use thiserror::Error;

/// The main error type for Cadence operations
#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Duplicate entity name: {0}")]
    DuplicateEntityName(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Dangling reference: entity {0} is dead")]
    DanglingReference(String),

    #[error("Cyclic parent: attaching {child} under {parent} would form a cycle")]
    CyclicParent { parent: String, child: String },

    #[error("Behavior error: {0}")]
    BehaviorError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Level error: {0}")]
    LevelError(String),

    #[error("Unknown state handle: {0}")]
    UnknownState(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

impl From<toml::de::Error> for CadenceError {
    fn from(err: toml::de::Error) -> Self {
        CadenceError::TomlParseError(err.to_string())
    }
}
