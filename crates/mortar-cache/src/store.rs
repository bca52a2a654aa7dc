//! The tiered artifact store.
//!
//! The primary tier is mortar's own artifact cache. A secondary, read-only
//! foreign tier (typically a Maven-format `~/.m2/repository`) can be layered
//! underneath it; artifacts found only there are promoted into the primary
//! tier by a one-way local copy on first access. Existence in the primary
//! tier is authoritative once promoted.

use mortar_core::{ArtifactKey, Coordinate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::layout;
use crate::CacheError;

/// One cache tier: a root directory in the shared on-disk layout.
#[derive(Debug, Clone)]
pub struct CacheTier {
    root: PathBuf,
}

impl CacheTier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of an artifact within this tier.
    pub fn artifact_file(&self, coordinate: &Coordinate, extension: &str) -> PathBuf {
        self.root.join(layout::artifact_path(coordinate, extension))
    }

    /// Absolute path of the mirrored repository metadata within this tier.
    pub fn metadata_file(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(layout::metadata_path(key))
    }
}

/// Lookup behavior on a primary-tier miss, selected at construction.
pub trait TierStrategy: Send + Sync {
    /// Attempt to satisfy a miss, promoting into the primary tier if a
    /// lower tier holds the artifact. Returns the primary-tier path on
    /// success, `None` on a full miss.
    fn fallback(
        &self,
        primary: &CacheTier,
        coordinate: &Coordinate,
        extension: &str,
    ) -> Result<Option<PathBuf>, CacheError>;
}

/// No secondary tier: a primary miss is a cache miss.
pub struct PrimaryOnly;

impl TierStrategy for PrimaryOnly {
    fn fallback(
        &self,
        _primary: &CacheTier,
        _coordinate: &Coordinate,
        _extension: &str,
    ) -> Result<Option<PathBuf>, CacheError> {
        Ok(None)
    }
}

/// Fall back to a read-only foreign-format tier, promoting hits into the
/// primary tier. Promotion is a plain local file copy, never the reverse
/// direction, and never touches freshness records.
pub struct ForeignFallback {
    foreign: CacheTier,
}

impl ForeignFallback {
    pub fn new(foreign_root: impl Into<PathBuf>) -> Self {
        Self {
            foreign: CacheTier::new(foreign_root),
        }
    }
}

impl TierStrategy for ForeignFallback {
    fn fallback(
        &self,
        primary: &CacheTier,
        coordinate: &Coordinate,
        extension: &str,
    ) -> Result<Option<PathBuf>, CacheError> {
        let foreign_file = self.foreign.artifact_file(coordinate, extension);
        if !foreign_file.exists() {
            return Ok(None);
        }

        let primary_file = primary.artifact_file(coordinate, extension);
        if let Some(parent) = primary_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::io("failed to create cache directory", parent, e))?;
        }

        fs::copy(&foreign_file, &primary_file)
            .map_err(|e| CacheError::io("failed to promote artifact", &foreign_file, e))?;

        debug!(
            "Promoted {} from {} to {}",
            coordinate,
            foreign_file.display(),
            primary_file.display()
        );

        Ok(Some(primary_file))
    }
}

/// The tiered artifact cache.
pub struct ArtifactCache {
    primary: CacheTier,
    strategy: Box<dyn TierStrategy>,
}

impl ArtifactCache {
    /// Open a cache over a primary tier only.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            primary: CacheTier::new(root),
            strategy: Box::new(PrimaryOnly),
        }
    }

    /// Open a cache with a foreign-format fallback tier.
    pub fn with_foreign(root: impl Into<PathBuf>, foreign_root: impl Into<PathBuf>) -> Self {
        Self {
            primary: CacheTier::new(root),
            strategy: Box::new(ForeignFallback::new(foreign_root)),
        }
    }

    /// Open a cache with a custom tier strategy.
    pub fn with_strategy(root: impl Into<PathBuf>, strategy: Box<dyn TierStrategy>) -> Self {
        Self {
            primary: CacheTier::new(root),
            strategy,
        }
    }

    pub fn root(&self) -> &Path {
        self.primary.root()
    }

    /// Resolve a coordinate to a primary-tier path.
    ///
    /// Checks the primary tier first; on a miss the tier strategy may
    /// promote from a lower tier. A second call for the same coordinate
    /// finds the promoted copy and performs no further work. `None` is a
    /// cache miss: the caller decides whether to go to the network.
    pub fn locate(
        &self,
        coordinate: &Coordinate,
        extension: &str,
    ) -> Result<Option<PathBuf>, CacheError> {
        let primary_file = self.primary.artifact_file(coordinate, extension);
        if primary_file.exists() {
            trace!("Cache hit: {}", primary_file.display());
            return Ok(Some(primary_file));
        }
        self.strategy.fallback(&self.primary, coordinate, extension)
    }

    /// Write artifact bytes into the primary tier.
    ///
    /// Writes to a temp file first and renames into place so a partial
    /// download never looks like a cached artifact.
    pub fn store(
        &self,
        coordinate: &Coordinate,
        extension: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, CacheError> {
        let target = self.primary.artifact_file(coordinate, extension);
        write_atomic(&target, bytes)?;
        debug!("Stored {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }

    /// Path of the mirrored repository metadata for an artifact, if cached.
    pub fn metadata(&self, key: &ArtifactKey) -> Option<PathBuf> {
        let file = self.primary.metadata_file(key);
        file.exists().then_some(file)
    }

    /// Mirror repository metadata bytes into the primary tier.
    pub fn store_metadata(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let target = self.primary.metadata_file(key);
        write_atomic(&target, bytes)?;
        debug!("Mirrored metadata for {} ({} bytes)", key, bytes.len());
        Ok(target)
    }
}

fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CacheError::io("failed to create cache directory", parent, e))?;
    }

    let temp = target.with_extension("tmp");
    fs::write(&temp, bytes).map_err(|e| CacheError::io("failed to write artifact", &temp, e))?;
    fs::rename(&temp, target)
        .map_err(|e| CacheError::io("failed to move artifact into place", target, e))?;
    Ok(())
}
