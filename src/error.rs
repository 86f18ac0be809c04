use thiserror::Error;

/// Kernel-level errors using thiserror for structured error handling.
///
/// These cover configuration mistakes that must stop the application early.
/// Faults raised by user handlers never surface here; the bus logs them and
/// keeps delivering.

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Kernel already initialized; only one message bus may exist per process")]
    AlreadyInitialized,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create log directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install tracing subscriber")]
    SubscriberInstall(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result returned by listeners, message-sugar handlers and commands
pub type HandlerResult = anyhow::Result<()>;

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
