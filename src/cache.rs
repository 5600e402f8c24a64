//! Memoized catalog loading keyed by the input files' signatures

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::data::{load_catalog, Catalog, CatalogPaths};
use crate::error::CatalogError;

/// Identity of an input file at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSignature {
    pub path: PathBuf,
    /// `None` when the file does not exist or cannot be inspected
    pub len: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl FileSignature {
    pub fn of(path: &Path) -> Self {
        let metadata = fs::metadata(path).ok();
        Self {
            path: path.to_path_buf(),
            len: metadata.as_ref().map(|m| m.len()),
            modified: metadata.and_then(|m| m.modified().ok()),
        }
    }
}

/// Signatures of both catalogs; a change in either invalidates the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub spain: FileSignature,
    pub romania: FileSignature,
}

impl CacheKey {
    pub fn of(paths: &CatalogPaths) -> Self {
        Self {
            spain: FileSignature::of(&paths.spain),
            romania: FileSignature::of(&paths.romania),
        }
    }
}

/// Holds the last loaded catalog and reloads only when the inputs change
///
/// The cache lives as long as its owner. The CLI runs once per invocation and
/// builds a fresh cache each time, so hits only happen in a process that
/// loads the same catalogs repeatedly (a long-lived service or the tests).
#[derive(Debug, Default)]
pub struct CatalogCache {
    entry: Option<(CacheKey, Arc<Catalog>)>,
    loads: usize,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached catalog for `paths`, loading it if the file signatures changed
    pub fn get_or_load(&mut self, paths: &CatalogPaths) -> Result<Arc<Catalog>, CatalogError> {
        let key = CacheKey::of(paths);
        if let Some((cached_key, catalog)) = &self.entry {
            if *cached_key == key {
                debug!("Catalog cache hit");
                return Ok(Arc::clone(catalog));
            }
        }

        debug!(?key, "Catalog cache miss, loading");
        let catalog = Arc::new(load_catalog(paths)?);
        self.loads += 1;
        self.entry = Some((key, Arc::clone(&catalog)));
        Ok(catalog)
    }

    /// Drop the cached catalog so the next call reloads
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Number of loads performed so far
    pub fn loads(&self) -> usize {
        self.loads
    }
}
