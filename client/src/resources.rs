//! Packaged resources: certificate bundles compiled into the binary, plus
//! optional directories that are searched after them.
//!
//! Resource names are relative and `/`-separated. A name with a leading `/`,
//! an empty segment or a `..` segment never matches anything.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::io::Cursor;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

/// Logical name of the bundle shipped with this crate.
pub const DEFAULT_BUNDLE: &str = "certificates/multi-certificate.pem";

const DEFAULT_BUNDLE_CONTENTS: &[u8] =
    include_bytes!("../resources/certificates/multi-certificate.pem");

/// Exclusively owned stream positioned at the start of bundle content.
pub type BundleStream = Box<dyn Read + Send>;

#[derive(Debug, Clone)]
pub struct ResourceSet {
    embedded: HashMap<String, Cow<'static, [u8]>>,
    dirs: Vec<PathBuf>,
}

impl Default for ResourceSet {
    fn default() -> Self {
        Self::embedded()
    }
}

impl ResourceSet {
    /// A set with no resources at all.
    pub fn empty() -> Self {
        Self {
            embedded: HashMap::new(),
            dirs: Vec::new(),
        }
    }

    /// The resources compiled into this crate.
    pub fn embedded() -> Self {
        let mut set = Self::empty();
        set.insert(DEFAULT_BUNDLE, DEFAULT_BUNDLE_CONTENTS);
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Cow<'static, [u8]>>) {
        self.embedded.insert(name.into(), contents.into());
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.add_dir(dir);
        self
    }

    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// Open the resource called `name`.
    ///
    /// Embedded resources win over directories; directories are searched in
    /// the order they were added. `Ok(None)` means no resource has that name.
    pub fn open(&self, name: &str) -> io::Result<Option<BundleStream>> {
        if !is_resource_name(name) {
            return Ok(None);
        }

        if let Some(contents) = self.embedded.get(name) {
            return Ok(Some(Box::new(Cursor::new(contents.clone()))));
        }

        for dir in &self.dirs {
            let path = dir.join(Path::new(name));
            if path.is_file() {
                let file = File::open(&path)?;
                return Ok(Some(Box::new(file)));
            }
        }

        Ok(None)
    }
}

fn is_resource_name(name: &str) -> bool {
    !name.is_empty() && name.split('/').all(|seg| !seg.is_empty() && seg != "..")
}
