//! Domain error types.

use crate::domain::universe::UniverseError;

/// Top-level error type for earnings-trader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("{service} unavailable: {reason}")]
    Upstream { service: String, reason: String },

    #[error("unexpected response from {service}: {reason}")]
    UpstreamPayload { service: String, reason: String },

    #[error("corrupt cache record {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("cache store error: {reason}")]
    CacheStore { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("failed to load universe {name} from {path}: {reason}")]
    UniverseLoad {
        name: String,
        path: String,
        reason: String,
    },

    #[error("unknown universe: {0}")]
    UnknownUniverse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn upstream(service: &str, reason: impl ToString) -> Self {
        TraderError::Upstream {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn payload(service: &str, reason: impl ToString) -> Self {
        TraderError::UpstreamPayload {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn config_invalid(section: &str, key: &str, reason: impl ToString) -> Self {
        TraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Transient upstream failures are the only errors worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TraderError::Upstream { .. })
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::CacheStore { .. } => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. }
            | TraderError::InvalidInput { .. }
            | TraderError::Universe(_)
            | TraderError::UniverseLoad { .. }
            | TraderError::UnknownUniverse(_) => 2,
            TraderError::Upstream { .. } | TraderError::UpstreamPayload { .. } => 3,
            TraderError::Decode { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
