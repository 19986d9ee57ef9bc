use std::error::Error as StdError;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use url::Url;

use crate::bundle::BundleLoader;
use crate::config::TrustConfig;
use crate::error::ConstructionError;
use crate::error::RequestError;
use crate::resources::DEFAULT_BUNDLE;
use crate::trust_store;

/// Blocking HTTPS client that trusts only the certificates of one bundle.
///
/// The bundle is read and turned into a TLS configuration once, when the
/// client is built. Requests reuse that configuration; nothing about it can
/// change afterwards. The client is cheap to clone and can be shared between
/// threads.
#[derive(Debug, Clone)]
pub struct TrustedHttpClient {
    client: reqwest::blocking::Client,
    bundle: String,
    anchors: usize,
}

impl TrustedHttpClient {
    /// Client trusting the bundle shipped with this crate.
    pub fn new() -> Result<Self, ConstructionError> {
        Self::with_bundle(DEFAULT_BUNDLE)
    }

    /// Client trusting `identifier`, a filesystem path or packaged resource name.
    pub fn with_bundle(identifier: impl Into<String>) -> Result<Self, ConstructionError> {
        Self::with_loader(identifier, &BundleLoader::default())
    }

    pub fn from_config(config: &TrustConfig) -> Result<Self, ConstructionError> {
        let loader = BundleLoader::new(config.resource_set());
        Self::with_loader(config.bundle.clone(), &loader)
    }

    pub fn with_loader(
        identifier: impl Into<String>,
        loader: &BundleLoader,
    ) -> Result<Self, ConstructionError> {
        let identifier = identifier.into();
        info!("Initializing trusted HTTP client with cert path: {identifier}");
        Self::build(&identifier, loader).map_err(|source| {
            error!("Failed to create trusted HTTP client from `{identifier}`: {source}");
            ConstructionError::new(identifier, source)
        })
    }

    fn build(
        identifier: &str,
        loader: &BundleLoader,
    ) -> Result<Self, Box<dyn StdError + Send + Sync + 'static>> {
        let bundle = loader.resolve(identifier)?;
        let authority = trust_store::build(bundle.stream)?;
        let tls = authority.client_config()?;
        let client = reqwest::blocking::Client::builder()
            .use_preconfigured_tls(tls)
            .build()?;

        Ok(Self {
            client,
            bundle: identifier.to_string(),
            anchors: authority.anchor_count(),
        })
    }

    /// Identifier of the bundle this client was built from.
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// Number of certificates the client trusts.
    pub fn anchor_count(&self) -> usize {
        self.anchors
    }

    /// GET `url` and return the response body as text.
    ///
    /// Only a 2xx response with a non-empty body counts as success. The
    /// response is fully read or dropped before this returns.
    pub fn fetch(&self, url: &str) -> Result<String, RequestError> {
        let target = parse_target(url)?;
        debug!("GET {target}");

        let response = self.client.get(target.clone()).send().map_err(|err| {
            error!("Request to {target} failed: {err}");
            RequestError::NetworkFailure(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Unexpected response code {} from {target}", status.as_u16());
            return Err(RequestError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().map_err(|err| {
            error!("Failed to read response body from {target}: {err}");
            RequestError::NetworkFailure(err)
        })?;
        if body.is_empty() {
            warn!("Empty response body from {target}");
            return Err(RequestError::EmptyBody);
        }

        Ok(body)
    }
}

fn parse_target(url: &str) -> Result<Url, RequestError> {
    if url.is_empty() {
        return Err(RequestError::InvalidArgument(
            "target URL cannot be empty".to_string(),
        ));
    }

    let target = Url::parse(url)
        .map_err(|err| RequestError::InvalidArgument(format!("invalid target URL `{url}`: {err}")))?;
    match target.scheme() {
        "http" | "https" => Ok(target),
        scheme => Err(RequestError::InvalidArgument(format!(
            "unsupported URL scheme `{scheme}` in `{url}`"
        ))),
    }
}
