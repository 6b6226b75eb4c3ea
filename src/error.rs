use thiserror::Error;

/// Main error type for launch specification handling
#[derive(Debug, Error)]
pub enum LaunchSpecError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    #[error("Invalid memory quantity '{input}': {reason}")]
    InvalidMemoryQuantity { input: String, reason: String },

    // Lookup errors
    #[error("App not found: {0}")]
    AppNotFound(String),

    // Path checks
    #[error("Missing {kind} for app {app}: {path}")]
    MissingPath {
        app: String,
        kind: String,
        path: String,
    },

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for launchspec operations
pub type Result<T> = std::result::Result<T, LaunchSpecError>;
