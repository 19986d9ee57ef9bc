//! Decoding a certificate bundle into trust anchors.
//!
//! Every X.509 certificate in the bundle becomes an independent trust anchor;
//! they do not need to share an issuer or form a chain. Nothing from the
//! platform's own root store is ever added.

use std::io::Read;
use std::sync::Arc;

use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::PemObject;
use tracing::info;
use tracing::warn;

use crate::error::TrustStoreError;

/// First byte of a DER-encoded certificate (ASN.1 SEQUENCE).
const DER_SEQUENCE_TAG: u8 = 0x30;

const PEM_BEGIN: &[u8] = b"-----BEGIN ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustEntry {
    alias: String,
    certificate: CertificateDer<'static>,
}

impl TrustEntry {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn certificate(&self) -> &CertificateDer<'static> {
        &self.certificate
    }
}

/// Certificates keyed by `cert0`, `cert1`, ... in bundle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStore {
    entries: Vec<TrustEntry>,
}

impl TrustStore {
    /// Read the whole stream and decode it. The stream is dropped before
    /// this returns, whether or not decoding succeeds.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, TrustStoreError> {
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents)?;
        drop(reader);
        Self::from_bytes(&contents)
    }

    pub fn from_bytes(contents: &[u8]) -> Result<Self, TrustStoreError> {
        let certificates = decode_certificates(contents);
        if certificates.is_empty() {
            return Err(TrustStoreError::NoCertificatesFound);
        }
        info!("Number of certificates loaded: {}", certificates.len());

        let entries = certificates
            .into_iter()
            .enumerate()
            .map(|(index, certificate)| TrustEntry {
                alias: format!("cert{index}"),
                certificate,
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(TrustEntry::alias)
    }

    pub fn get(&self, alias: &str) -> Option<&CertificateDer<'static>> {
        self.entries
            .iter()
            .find(|entry| entry.alias == alias)
            .map(TrustEntry::certificate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrustEntry> {
        self.entries.iter()
    }
}

/// Pull every X.509 certificate out of `contents`.
///
/// PEM `CERTIFICATE` sections are decoded in order; other section types are
/// ignored. A malformed section is skipped and decoding resumes at the next
/// `-----BEGIN ` line. Input without any PEM section that starts like DER is
/// tried as a single DER certificate. Blocks that do not parse as X.509 are
/// skipped.
fn decode_certificates(contents: &[u8]) -> Vec<CertificateDer<'static>> {
    let sections = pem_sections(contents);
    let mut blocks = Vec::new();
    for (position, section) in sections.iter().enumerate() {
        // One BEGIN marker per section, so an error only loses this section.
        for item in CertificateDer::pem_slice_iter(section) {
            match item {
                Ok(der) => blocks.push(der),
                Err(err) => {
                    warn!("Skipping malformed PEM section {position}: {err}");
                    break;
                }
            }
        }
    }

    if sections.is_empty() && contents.first() == Some(&DER_SEQUENCE_TAG) {
        blocks.push(CertificateDer::from(contents.to_vec()));
    }

    blocks
        .into_iter()
        .enumerate()
        .filter_map(|(position, der)| match webpki::anchor_from_trusted_cert(&der) {
            Ok(_) => Some(der),
            Err(err) => {
                warn!("Skipping bundle entry {position}: not an X.509 certificate ({err:?})");
                None
            }
        })
        .collect()
}

/// Split `contents` so each slice starts at a `-----BEGIN ` marker and runs
/// up to the next one. Text before the first marker is dropped.
fn pem_sections(contents: &[u8]) -> Vec<&[u8]> {
    let starts: Vec<usize> = contents
        .windows(PEM_BEGIN.len())
        .enumerate()
        .filter_map(|(index, window)| (window == PEM_BEGIN).then_some(index))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(contents.len());
            &contents[start..end]
        })
        .collect()
}

/// Server-certificate validation derived from a [`TrustStore`].
#[derive(Debug, Clone)]
pub struct TrustAuthority {
    verifier: Arc<WebPkiServerVerifier>,
    provider: Arc<CryptoProvider>,
    anchors: usize,
}

impl TrustAuthority {
    pub fn from_store(store: &TrustStore) -> Result<Self, TrustStoreError> {
        let mut roots = RootCertStore::empty();
        for entry in store.iter() {
            roots.add(entry.certificate().clone()).map_err(|err| {
                TrustStoreError::TrustInit(format!("rejected {}: {err}", entry.alias()))
            })?;
        }

        let provider = crypto_provider();
        let verifier =
            WebPkiServerVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
                .build()
                .map_err(|err| TrustStoreError::TrustInit(err.to_string()))?;

        Ok(Self {
            verifier,
            provider,
            anchors: store.len(),
        })
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors
    }

    /// TLS client configuration that validates servers against these anchors
    /// only and presents no client certificate.
    pub fn client_config(&self) -> Result<ClientConfig, TrustStoreError> {
        let config = ClientConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_safe_default_protocol_versions()
            .map_err(|err| {
                TrustStoreError::TrustInit(format!("failed to set TLS protocol versions: {err}"))
            })?
            .with_webpki_verifier(Arc::clone(&self.verifier))
            .with_no_client_auth();
        Ok(config)
    }
}

/// Decode `stream` and derive a trust authority from its certificates.
pub fn build(stream: impl Read) -> Result<TrustAuthority, TrustStoreError> {
    let store = TrustStore::from_reader(stream)?;
    TrustAuthority::from_store(&store)
}

/// The process-wide provider when one is installed, `ring` otherwise.
fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()))
}
