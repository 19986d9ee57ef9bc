use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Every resolution strategy was tried and none could open the bundle.
#[derive(Debug, Error)]
#[error(
    "failed to load certificate bundle `{identifier}` from any location (tried {})",
    .attempts.join(", ")
)]
pub struct BundleNotFound {
    pub identifier: String,
    /// Names of the resolvers that were consulted, in order.
    pub attempts: Vec<&'static str>,
}

/// Failures while turning a bundle stream into a trust authority.
#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error("failed to read certificate bundle")]
    Io(#[from] std::io::Error),

    #[error("no certificates found in bundle")]
    NoCertificatesFound,

    #[error("failed to initialize trust authority: {0}")]
    TrustInit(String),
}

/// Building a [`crate::TrustedHttpClient`] failed.
///
/// Loader, decoder and transport failures all collapse into this one type;
/// the underlying failure stays reachable through [`StdError::source`].
#[derive(Debug, Error)]
#[error("failed to create trusted HTTP client from `{identifier}`")]
pub struct ConstructionError {
    identifier: String,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl ConstructionError {
    pub(crate) fn new(
        identifier: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            source: source.into(),
        }
    }

    /// Bundle identifier the client was being built from.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The failure that stopped construction.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unexpected response code: {0}")]
    UnexpectedStatus(u16),

    #[error("response body is empty")]
    EmptyBody,

    #[error("request failed")]
    NetworkFailure(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
