use serde::Serialize;
use std::io;
use thiserror::Error;

/// Every failure class a probe can end in once it has been classified.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum PingErrorKind {
    #[error("Network is unavailable. Please check your internet connection.")]
    NetworkUnavailable,

    #[error("The provided IP address is invalid.")]
    InvalidIPAddress,

    #[error("Unable to resolve host: {0}")]
    UnknownHost(String),

    #[error("Error executing ping command.")]
    CommandExecutionError,

    #[error("Ping operation timed out.")]
    Timeout,

    #[error("Permission denied. The app might not have the necessary permissions.")]
    PermissionDenied,

    #[allow(dead_code)]
    #[error("All packets were lost during transmission.")]
    PacketLoss,

    #[error("An unknown error occurred: {0}")]
    UnknownError(String),
}

/// Coarse partition used to pick the user-facing message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Configuration,
    Other,
}

impl PingErrorKind {
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            PingErrorKind::NetworkUnavailable | PingErrorKind::UnknownHost(_) | PingErrorKind::PacketLoss
        )
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, PingErrorKind::InvalidIPAddress | PingErrorKind::PermissionDenied)
    }

    pub fn category(&self) -> ErrorCategory {
        if self.is_network_error() {
            ErrorCategory::Network
        } else if self.is_configuration_error() {
            ErrorCategory::Configuration
        } else {
            ErrorCategory::Other
        }
    }

    /// Renders the kind through its category template.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!(
                "Network Error: {}\nPlease check your internet connection and try again.",
                self
            ),
            ErrorCategory::Configuration => format!(
                "Configuration Error: {}\nPlease check your app settings and permissions.",
                self
            ),
            ErrorCategory::Other => format!(
                "Error: {}\nPlease try again or contact support if the problem persists.",
                self
            ),
        }
    }
}

/// A runtime failure raised while a probe was being launched or awaited.
///
/// These are the raw shapes the classifier translates into [`PingErrorKind`].
#[derive(Error, Debug)]
pub enum ProbeFailure {
    #[error("security failure: {0}")]
    Security(String),

    #[allow(dead_code)]
    #[error("{0}")]
    UnresolvedHost(String),

    #[error(transparent)]
    Io(io::Error),

    #[error("probe worker was interrupted")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

impl From<io::Error> for ProbeFailure {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::PermissionDenied => ProbeFailure::Security(e.to_string()),
            io::ErrorKind::Interrupted => ProbeFailure::Interrupted,
            _ => ProbeFailure::Io(e),
        }
    }
}

/// Returned when a probe is requested while another one is still in flight.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("a probe is already in flight")]
pub struct ProbeBusy;
