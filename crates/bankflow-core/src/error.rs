//! Error types for bankflow.

use std::fmt;
use thiserror::Error;

/// A configuration value that must be present before the bank listing can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Token,
    Country,
    EndUserId,
}

impl MissingField {
    /// Message shown to the end user on the missing-inputs page.
    pub fn user_message(&self) -> &'static str {
        match self {
            MissingField::Token => {
                "Missing token. Get a token from the open banking portal and provide it in \
                 the settings file or the BANKFLOW_TOKEN environment variable."
            }
            MissingField::Country => {
                "Missing country parameter. Provide a two-letter country code (ISO 3166) in \
                 the settings file or the BANKFLOW_COUNTRY environment variable."
            }
            MissingField::EndUserId => "Missing end user ID.",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Token => "token",
            MissingField::Country => "country",
            MissingField::EndUserId => "end user id",
        };
        f.write_str(name)
    }
}

/// The shared error type for every bankflow crate.
///
/// Upstream failures are carried unchanged so the web layer can decide how to
/// surface them. Nothing in the workspace retries on `ReferenceMismatch`.
#[derive(Error, Debug, Clone)]
pub enum BankflowError {
    /// HTTP method other than GET or POST was requested from the transport
    #[error("Unexpected method: {0}")]
    InvalidMethod(String),

    /// Upstream API answered with a non-success status
    #[error("Upstream HTTP error {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Redirect-back reference does not match the flow's reference id
    #[error("Reference error")]
    ReferenceMismatch,

    /// The flow outlived its configured time to live
    #[error("Consent flow expired")]
    FlowExpired,

    /// Token, country or end user id is absent
    #[error("Missing configuration: {0}")]
    MissingConfiguration(MissingField),

    /// A flow step was invoked before the step it depends on
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Upstream JSON lacks a field the flow depends on
    #[error("Unexpected upstream response: {0}")]
    UnexpectedResponse(String),

    /// Connection, timeout or other transport-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Rejected access, e.g. a download path escaping the output directory
    #[error("Security error: {0}")]
    Security(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BankflowError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an UpstreamHttp error
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::UpstreamHttp {
            status,
            body: body.into(),
        }
    }

    /// Creates a Precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Creates an UnexpectedResponse error
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Security error
    pub fn security(message: impl Into<String>) -> Self {
        Self::Security(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_reference_mismatch(&self) -> bool {
        matches!(self, Self::ReferenceMismatch)
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Returns the upstream status code when this is an `UpstreamHttp` error.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for BankflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for BankflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BankflowError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, BankflowError>`.
pub type Result<T> = std::result::Result<T, BankflowError>;
