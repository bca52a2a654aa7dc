//! Cache management for mortar.
//!
//! This crate handles:
//! - The tiered local artifact store (primary tier plus an optional
//!   read-only foreign-format tier with one-way promotion)
//! - On-disk path layout for artifacts and repository metadata
//! - Per-coordinate freshness records gating network refreshes
//! - The persisted solution cache for previously solved projects

use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub mod layout;
pub mod metadata;
pub mod solution;
pub mod store;

pub use metadata::{MetadataRecord, MetadataStore, UpdatePolicy};
pub use solution::SolutionCache;
pub use store::{ArtifactCache, CacheTier, ForeignFallback, PrimaryOnly, TierStrategy};

/// Error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {message} ({path})")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid cache record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("invalid solution cache: {0}")]
    Codec(#[from] bincode::Error),

    #[error("solution cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("could not determine a cache directory for this platform")]
    NoCacheDir,
}

impl CacheError {
    pub(crate) fn io(message: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            message: message.into(),
            path: path.into(),
            source,
        }
    }
}

/// Get the default primary cache root.
///
/// - Linux: `~/.cache/mortar`
/// - macOS: `~/Library/Caches/mortar`
/// - Windows: `%LOCALAPPDATA%\mortar\cache`
pub fn default_cache_root() -> Result<PathBuf, CacheError> {
    if let Ok(dir) = std::env::var(mortar_core::EnvVars::MORTAR_CACHE_DIR) {
        return Ok(PathBuf::from(dir));
    }
    let dirs = ProjectDirs::from("build", "mortar", "mortar").ok_or(CacheError::NoCacheDir)?;
    Ok(dirs.cache_dir().to_path_buf())
}

/// Get the default foreign-format (Maven layout) cache root, if the user
/// has one: `~/.m2/repository`.
pub fn default_maven_root() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(mortar_core::EnvVars::MORTAR_MAVEN_CACHE_DIR) {
        return Some(PathBuf::from(dir));
    }
    let home = dirs_next::home_dir()?;
    Some(home.join(".m2").join("repository"))
}

/// Ensure a directory exists.
pub fn ensure_dir(path: &PathBuf) -> Result<(), CacheError> {
    if !path.exists() {
        debug!("Creating directory: {}", path.display());
        std::fs::create_dir_all(path)
            .map_err(|e| CacheError::io("failed to create directory", path.clone(), e))?;
    }
    Ok(())
}
