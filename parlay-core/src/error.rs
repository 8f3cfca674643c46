//! Error types for parlay operations

use crate::Namespace;
use std::fmt;
use thiserror::Error;

/// Classification of a remote-tier failure.
///
/// Decided once at the remote-store boundary, never re-derived from
/// message text by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Network drop, timeout, or server-side outage.
    Transient,
    /// Auth or row-policy rejection.
    Permission,
    /// The requested row does not exist.
    NotFound,
    /// The remote rejected the shape of the request.
    Validation,
}

impl RemoteErrorKind {
    /// Whether a failure of this kind disables the remote tier.
    pub fn opens_circuit(&self) -> bool {
        matches!(self, Self::Transient | Self::Permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure reported by the remote record store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Remote {kind} failure: {detail}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub detail: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transient, detail)
    }

    pub fn permission(detail: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Permission, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, detail)
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Validation, detail)
    }

    pub fn opens_circuit(&self) -> bool {
        self.kind.opens_circuit()
    }
}

/// Local key-value tier errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocalStoreError {
    #[error("Local storage quota exceeded writing {key} ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },

    #[error("Local storage backend failed: {reason}")]
    Backend { reason: String },
}

impl LocalStoreError {
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Caller-side mistakes the storage layer cannot route around.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Payload is not JSON-serializable: {reason}")]
    NotSerializable { reason: String },

    #[error("Cached payload for {namespace}/{key} does not match the requested type: {reason}")]
    PayloadMismatch {
        namespace: Namespace,
        key: String,
        reason: String,
    },

    #[error("Invalid cache key: {reason}")]
    InvalidKey { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read config file: {reason}")]
    Io { reason: String },

    #[error("Failed to parse config: {reason}")]
    Parse { reason: String },
}

/// Errors from the generative-AI collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No API key configured for the analysis provider")]
    MissingCredentials,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Transport error talking to {provider}: {reason}")]
    Transport { provider: String, reason: String },
}

/// Master error type for all parlay errors.
#[derive(Debug, Clone, Error)]
pub enum ParlayError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Local storage error: {0}")]
    Local(#[from] LocalStoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Result type alias for parlay operations.
pub type ParlayResult<T> = Result<T, ParlayError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_and_permission_open_circuit() {
        assert!(RemoteErrorKind::Transient.opens_circuit());
        assert!(RemoteErrorKind::Permission.opens_circuit());
        assert!(!RemoteErrorKind::NotFound.opens_circuit());
        assert!(!RemoteErrorKind::Validation.opens_circuit());
    }

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::permission("row-level security rejected insert");
        let msg = err.to_string();
        assert!(msg.contains("permission"));
        assert!(msg.contains("row-level security"));
    }

    #[test]
    fn test_local_quota_display() {
        let err = LocalStoreError::QuotaExceeded {
            key: "parlay:matchup:kc-lv".to_string(),
            bytes: 4096,
        };
        assert!(err.is_quota());
        let msg = err.to_string();
        assert!(msg.contains("quota"));
        assert!(msg.contains("kc-lv"));
        assert!(msg.contains("4096"));
    }

    #[test]
    fn test_payload_mismatch_display() {
        let err = ValidationError::PayloadMismatch {
            namespace: Namespace::Schedule,
            key: "Week 12".to_string(),
            reason: "missing field `games`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("schedule/Week 12"));
        assert!(msg.contains("games"));
    }

    #[test]
    fn test_parlay_error_from_variants() {
        let remote = ParlayError::from(RemoteError::transient("timeout"));
        assert!(matches!(remote, ParlayError::Remote(_)));

        let local = ParlayError::from(LocalStoreError::Backend {
            reason: "io".to_string(),
        });
        assert!(matches!(local, ParlayError::Local(_)));

        let validation = ParlayError::from(ValidationError::InvalidKey {
            reason: "empty".to_string(),
        });
        assert!(matches!(validation, ParlayError::Validation(_)));

        let config = ParlayError::from(ConfigError::MissingRequired {
            field: "local_store_path".to_string(),
        });
        assert!(matches!(config, ParlayError::Config(_)));

        let llm = ParlayError::from(LlmError::MissingCredentials);
        assert!(matches!(llm, ParlayError::Llm(_)));
    }
}
