//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a provider adapter.
///
/// Never propagated past [`Analytics`](crate::Analytics); it is logged and the
/// remaining providers still receive the call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend SDK rejected the call.
    #[error("backend error: {0}")]
    Sdk(String),

    /// The transport consuming this provider's output has gone away.
    #[error("backend transport disconnected")]
    Disconnected,
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid analytics config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// An analytics context accessor was used outside of an entered context.
    #[error("analytics context accessed outside of an entered AnalyticsContext")]
    MissingContext,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
