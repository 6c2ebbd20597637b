use std::fmt;

/// One of the two downstream services an event can be relayed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Primary,
    Secondary,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Primary => f.write_str("primary"),
            Destination::Secondary => f.write_str("secondary"),
        }
    }
}

/// Why a delivery attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    /// The destination rejected the request (4xx).
    Client(u16),
    /// The destination failed while handling the request (5xx).
    Server(u16),
    /// Connect failure or timeout.
    Connection,
    Unexpected,
}

impl DeliveryErrorKind {
    pub fn code(&self) -> String {
        match self {
            DeliveryErrorKind::Client(status) => format!("HTTP_CLIENT_ERROR_{status}"),
            DeliveryErrorKind::Server(status) => format!("HTTP_SERVER_ERROR_{status}"),
            DeliveryErrorKind::Connection => "CONNECTION_ERROR".to_string(),
            DeliveryErrorKind::Unexpected => "UNEXPECTED_ERROR".to_string(),
        }
    }
}

/// Result of a single attempt against a single destination.
///
/// Failures are ordinary values here: adapters report transport and remote
/// errors through `failed`, never through the error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub succeeded: bool,
    pub message: String,
    pub error_kind: Option<DeliveryErrorKind>,
}

impl DeliveryOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            error_kind: None,
        }
    }

    pub fn failed(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            error_kind: Some(kind),
        }
    }

    /// Wire-level error code, e.g. `HTTP_CLIENT_ERROR_400`.
    pub fn error_code(&self) -> Option<String> {
        self.error_kind.as_ref().map(DeliveryErrorKind::code)
    }
}
