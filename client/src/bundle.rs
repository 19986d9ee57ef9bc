//! Locating a certificate bundle.
//!
//! A bundle identifier may be a filesystem path or the name of a packaged
//! resource. [`BundleLoader`] asks an ordered list of [`Resolver`]s to open it
//! and hands back the first stream it gets. A resolver that fails is logged
//! and skipped; only running out of resolvers is an error.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::BundleNotFound;
use crate::resources::BundleStream;
use crate::resources::ResourceSet;

/// Namespace searched by [`ScopedResourceResolver`] when none is given.
pub const DEFAULT_RESOURCE_SCOPE: &str = "certpin";

/// One way of turning a bundle identifier into a byte stream.
pub trait Resolver: Send + Sync {
    /// Short, stable name used in logs and in [`BundleNotFound::attempts`].
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this resolver has nothing under `identifier`.
    fn try_open(&self, identifier: &str) -> io::Result<Option<BundleStream>>;
}

/// Opens the identifier as a path on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResolver;

impl Resolver for FileResolver {
    fn name(&self) -> &'static str {
        "file"
    }

    fn try_open(&self, identifier: &str) -> io::Result<Option<BundleStream>> {
        let path = Path::new(identifier);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(path)?;
        Ok(Some(Box::new(file)))
    }
}

/// Looks the identifier up verbatim in the packaged resources.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    resources: Arc<ResourceSet>,
}

impl ResourceResolver {
    pub fn new(resources: Arc<ResourceSet>) -> Self {
        Self { resources }
    }
}

impl Resolver for ResourceResolver {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn try_open(&self, identifier: &str) -> io::Result<Option<BundleStream>> {
        self.resources.open(identifier)
    }
}

/// Looks the identifier up inside one namespace of the packaged resources,
/// i.e. `<scope>/<identifier>`.
#[derive(Debug, Clone)]
pub struct ScopedResourceResolver {
    resources: Arc<ResourceSet>,
    scope: String,
}

impl ScopedResourceResolver {
    pub fn new(resources: Arc<ResourceSet>, scope: impl Into<String>) -> Self {
        Self {
            resources,
            scope: scope.into(),
        }
    }
}

impl Resolver for ScopedResourceResolver {
    fn name(&self) -> &'static str {
        "scoped-resource"
    }

    fn try_open(&self, identifier: &str) -> io::Result<Option<BundleStream>> {
        let scope = self.scope.trim_end_matches('/');
        self.resources.open(&format!("{scope}/{identifier}"))
    }
}

/// Retries the packaged-resource lookup with one leading `/` removed.
#[derive(Debug, Clone)]
pub struct NormalizedResourceResolver {
    resources: Arc<ResourceSet>,
}

impl NormalizedResourceResolver {
    pub fn new(resources: Arc<ResourceSet>) -> Self {
        Self { resources }
    }
}

impl Resolver for NormalizedResourceResolver {
    fn name(&self) -> &'static str {
        "normalized-resource"
    }

    fn try_open(&self, identifier: &str) -> io::Result<Option<BundleStream>> {
        match identifier.strip_prefix('/') {
            Some(stripped) => self.resources.open(stripped),
            // Identical to the plain resource lookup, which already missed.
            None => Ok(None),
        }
    }
}

/// A bundle stream together with the resolver that produced it.
pub struct ResolvedBundle {
    pub resolver: &'static str,
    pub stream: BundleStream,
}

impl std::fmt::Debug for ResolvedBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBundle")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

pub struct BundleLoader {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl Default for BundleLoader {
    fn default() -> Self {
        Self::new(ResourceSet::embedded())
    }
}

impl BundleLoader {
    /// The standard chain: file, resource, scoped resource, normalized resource.
    pub fn new(resources: ResourceSet) -> Self {
        Self::with_scope(resources, DEFAULT_RESOURCE_SCOPE)
    }

    pub fn with_scope(resources: ResourceSet, scope: impl Into<String>) -> Self {
        let resources = Arc::new(resources);
        Self::from_resolvers(vec![
            Box::new(FileResolver),
            Box::new(ResourceResolver::new(Arc::clone(&resources))),
            Box::new(ScopedResourceResolver::new(Arc::clone(&resources), scope)),
            Box::new(NormalizedResourceResolver::new(resources)),
        ])
    }

    pub fn from_resolvers(resolvers: Vec<Box<dyn Resolver>>) -> Self {
        Self { resolvers }
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub fn resolve(&self, identifier: &str) -> Result<ResolvedBundle, BundleNotFound> {
        let mut attempts = Vec::with_capacity(self.resolvers.len());
        for resolver in &self.resolvers {
            let name = resolver.name();
            attempts.push(name);
            match resolver.try_open(identifier) {
                Ok(Some(stream)) => {
                    info!("Loaded certificate bundle `{identifier}` via {name} lookup");
                    return Ok(ResolvedBundle {
                        resolver: name,
                        stream,
                    });
                }
                Ok(None) => {
                    debug!("Certificate bundle `{identifier}` not found via {name} lookup");
                }
                Err(err) => {
                    warn!("Failed to load certificate bundle `{identifier}` via {name} lookup: {err}");
                }
            }
        }

        error!("Failed to load certificate bundle from any location: {identifier}");
        Err(BundleNotFound {
            identifier: identifier.to_string(),
            attempts,
        })
    }
}

impl std::fmt::Debug for BundleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleLoader")
            .field("resolvers", &self.resolver_names())
            .finish()
    }
}
