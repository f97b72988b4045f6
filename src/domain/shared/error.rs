//! Domain errors

use thiserror::Error;

/// Failure reported by an external collaborator (REST backend, token issuer,
/// transport engine).
///
/// The human-readable message sent by the backend, if any, is extracted once
/// when the error is built so nothing downstream has to dig through response
/// shapes again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Request failed with status {status}")]
    Http { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    /// Message suitable for showing to the user, when the backend sent one
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ServiceError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Fatal failure of a session attempt.
///
/// Each kind keeps the originating [`ServiceError`] as its source for logs; only
/// [`InitializationError::user_message`] is meant for the error panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitializationError {
    #[error("Cannot initialize call")]
    TargetResolution {
        message: Option<String>,
        #[source]
        source: ServiceError,
    },

    #[error("Cannot obtain a session credential")]
    Credential {
        message: Option<String>,
        #[source]
        source: ServiceError,
    },

    #[error("Cannot join the call")]
    TransportJoin {
        message: Option<String>,
        #[source]
        source: ServiceError,
    },

    /// The screen was disposed while the attempt was in flight
    #[error("Initialization cancelled")]
    Cancelled,
}

impl InitializationError {
    pub fn target_resolution(source: ServiceError) -> Self {
        Self::TargetResolution {
            message: source.user_message().map(str::to_string),
            source,
        }
    }

    pub fn credential(source: ServiceError) -> Self {
        Self::Credential {
            message: source.user_message().map(str::to_string),
            source,
        }
    }

    pub fn transport_join(source: ServiceError) -> Self {
        Self::TransportJoin {
            message: source.user_message().map(str::to_string),
            source,
        }
    }

    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            InitializationError::TargetResolution { .. } => "target_resolution",
            InitializationError::Credential { .. } => "credential",
            InitializationError::TransportJoin { .. } => "transport_join",
            InitializationError::Cancelled => "cancelled",
        }
    }

    /// Text for the error panel. Falls back to the generic description when
    /// the backend did not provide one.
    pub fn user_message(&self) -> String {
        let extracted = match self {
            InitializationError::TargetResolution { message, .. }
            | InitializationError::Credential { message, .. }
            | InitializationError::TransportJoin { message, .. } => message.clone(),
            InitializationError::Cancelled => None,
        };
        extracted.unwrap_or_else(|| self.to_string())
    }
}
