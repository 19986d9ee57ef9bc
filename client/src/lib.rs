//! HTTPS client whose only trust roots are the certificates of an explicit
//! PEM bundle.
//!
//! ```no_run
//! use certpin_client::TrustedHttpClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TrustedHttpClient::with_bundle("/etc/certpin/corp-roots.pem")?;
//! let body = client.fetch("https://internal.example.com/status")?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

pub mod bundle;
mod client;
pub mod config;
pub mod error;
pub mod resources;
pub mod trust_store;

pub use bundle::BundleLoader;
pub use bundle::ResolvedBundle;
pub use bundle::Resolver;
pub use client::TrustedHttpClient;
pub use config::TrustConfig;
pub use error::BundleNotFound;
pub use error::ConfigError;
pub use error::ConstructionError;
pub use error::RequestError;
pub use error::TrustStoreError;
pub use resources::DEFAULT_BUNDLE;
pub use resources::ResourceSet;
pub use trust_store::TrustAuthority;
pub use trust_store::TrustStore;
