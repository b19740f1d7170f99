use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Authentication failed for {url} (HTTP {status})")]
    AuthenticationFailed { url: String, status: u16 },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid dependency '{name}': {reason}")]
    InvalidDependency { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Input,
    Configuration,
    Internal,
}

impl FinderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FinderError::Http(_) | FinderError::Transport { .. } => ErrorCategory::Network,
            FinderError::AuthenticationFailed { .. } => ErrorCategory::Authentication,
            FinderError::InvalidUrl { .. } | FinderError::InvalidDependency { .. } => {
                ErrorCategory::Input
            }
            FinderError::ConfigValidationError { .. } | FinderError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            FinderError::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity to the registry and retry; the source is unknown, not absent"
            }
            ErrorCategory::Authentication => {
                "Check the registry credentials (username/password) configured for this registry URL"
            }
            ErrorCategory::Input => "Use a dependency name of the form group:artifact and an http(s) registry URL",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::Internal => "Re-run with --verbose and report the log output",
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
