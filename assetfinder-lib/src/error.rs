//! Error handling for discovery operations.
//!
//! Two error types live here. `AssetFinderError` is what a discovery call
//! can return to its caller. `SourceError` describes one lookup source
//! failing for one domain; the engine logs it and carries on, so it never
//! reaches the caller.

use std::fmt;
use std::time::Duration;

/// Main error type for discovery operations.
///
/// Only failures that happen before any lookup starts surface through this
/// type; a failing source is never fatal.
#[derive(Debug, Clone)]
pub enum AssetFinderError {
    /// Supporting infrastructure (the log sink) could not be initialized
    Setup {
        component: String,
        message: String,
    },

    /// Configuration errors (invalid settings, unparsable files, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading domain lists or config files
    FileError {
        path: String,
        message: String,
    },

    /// A source name that does not match any built-in source
    InvalidSource {
        name: String,
    },
}

impl AssetFinderError {
    /// Create a new setup error.
    pub fn setup<C: Into<String>, M: Into<String>>(component: C, message: M) -> Self {
        Self::Setup {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown-source error.
    pub fn invalid_source<N: Into<String>>(name: N) -> Self {
        Self::InvalidSource { name: name.into() }
    }

    /// Whether this error happened while preparing a discovery run.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup { .. })
    }
}

impl fmt::Display for AssetFinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup { component, message } => {
                write!(f, "Setup error ({}): {}", component, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::InvalidSource { name } => {
                write!(
                    f,
                    "Unknown source '{}' (use --list-sources to see all)",
                    name
                )
            }
        }
    }
}

impl std::error::Error for AssetFinderError {}

/// Failure of a single lookup source for a single domain.
#[derive(Debug, Clone)]
pub enum SourceError {
    /// Connection, TLS or transport level failure
    Network {
        message: String,
        source: Option<String>,
    },

    /// The service answered with a non-success HTTP status
    Status { code: u16 },

    /// The response body could not be decoded
    Parse { message: String },

    /// The opt-in per-call deadline elapsed
    Timeout { duration: Duration },
}

impl SourceError {
    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new HTTP status error.
    pub fn status(code: u16) -> Self {
        Self::Status { code }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Check if this error suggests the call could succeed later.
    ///
    /// The engine never retries; the flag is recorded with each failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Status { code: 429 | 500..=599 }
        )
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Status { code } => write!(f, "Unexpected HTTP status {}", code),
            Self::Parse { message } => write!(f, "Parse error: {}", message),
            Self::Timeout { duration } => write!(f, "Timeout after {:?}", duration),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(format!("Response decoding failed: {}", err))
        } else if let Some(status) = err.status() {
            Self::status(status.as_u16())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON parsing failed: {}", err))
    }
}
