use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::resources::DEFAULT_BUNDLE;
use crate::resources::ResourceSet;

/// Overrides the bundle identifier when set to a non-blank value.
pub const CA_BUNDLE_ENV_VAR: &str = "CERTPIN_CA_BUNDLE";

/// Extra resource directories, separated like `PATH`.
pub const RESOURCE_PATH_ENV_VAR: &str = "CERTPIN_RESOURCE_PATH";

/// Where the trusted client gets its certificates from.
///
/// ```toml
/// bundle = "/etc/certpin/corp-roots.pem"
/// resource_dirs = ["/usr/share/certpin"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustConfig {
    /// Filesystem path or packaged resource name of the PEM bundle.
    #[serde(default = "default_bundle")]
    pub bundle: String,

    /// Directories searched for packaged resources after the embedded ones.
    #[serde(default)]
    pub resource_dirs: Vec<PathBuf>,
}

fn default_bundle() -> String {
    DEFAULT_BUNDLE.to_string()
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            bundle: default_bundle(),
            resource_dirs: Vec::new(),
        }
    }
}

impl TrustConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply [`CA_BUNDLE_ENV_VAR`] and [`RESOURCE_PATH_ENV_VAR`] from the
    /// process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var_os(key))
    }

    pub fn apply_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let bundle = lookup(CA_BUNDLE_ENV_VAR);
        if let Some(bundle) = bundle
            .as_deref()
            .and_then(OsStr::to_str)
            .map(str::trim)
            .filter(|bundle| !bundle.is_empty())
        {
            self.bundle = bundle.to_string();
        }

        if let Some(paths) = lookup(RESOURCE_PATH_ENV_VAR) {
            self.resource_dirs.extend(
                std::env::split_paths(&paths).filter(|dir| !dir.as_os_str().is_empty()),
            );
        }

        self
    }

    /// Embedded resources followed by [`TrustConfig::resource_dirs`].
    pub fn resource_set(&self) -> ResourceSet {
        let mut resources = ResourceSet::embedded();
        for dir in &self.resource_dirs {
            resources.add_dir(dir.clone());
        }
        resources
    }
}
