//! Persisted resolution results.
//!
//! A solved project's per-scope dependency set is cached in binary form so
//! an unchanged project can skip the graph walk entirely. Entries carry a
//! versioned header and are invalidated wholesale on a format bump.

use mortar_core::{Coordinate, DependencyDescriptor, Scope};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::CacheError;

/// Current solution cache format version.
const SOLUTION_VERSION: u32 = 1;

/// Directory name for solution entries under the cache root.
const SOLUTIONS_DIR: &str = "solutions";

/// Header for cached solutions to track format version.
#[derive(serde::Serialize, serde::Deserialize)]
struct SolutionHeader {
    version: u32,
    /// Timestamp when the entry was created (unix epoch seconds).
    created_at: u64,
}

/// Cache of solved dependency sets, keyed by root coordinate and scope.
pub struct SolutionCache {
    root: PathBuf,
}

impl SolutionCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, coordinate: &Coordinate, scope: Scope) -> PathBuf {
        self.root
            .join(SOLUTIONS_DIR)
            .join(coordinate.group_as_path())
            .join(&coordinate.artifact_id)
            .join(&coordinate.version)
            .join(format!("{}.bin", scope))
    }

    /// Load a cached solution if present and format-compatible.
    pub fn load(
        &self,
        coordinate: &Coordinate,
        scope: Scope,
    ) -> Result<Option<Vec<DependencyDescriptor>>, CacheError> {
        let path = self.entry_path(coordinate, scope);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)
            .map_err(|e| CacheError::io("failed to open cached solution", &path, e))?;
        let mut reader = BufReader::new(file);

        let header: SolutionHeader = bincode::deserialize_from(&mut reader)?;
        if header.version != SOLUTION_VERSION {
            debug!(
                "Solution cache version mismatch: expected {}, found {}",
                SOLUTION_VERSION, header.version
            );
            return Err(CacheError::VersionMismatch {
                expected: SOLUTION_VERSION,
                found: header.version,
            });
        }

        let dependencies: Vec<DependencyDescriptor> = bincode::deserialize_from(&mut reader)?;

        debug!(
            "Loaded cached solution for {} [{}] with {} dependencies",
            coordinate,
            scope,
            dependencies.len()
        );

        Ok(Some(dependencies))
    }

    /// Persist a solved dependency set.
    pub fn save(
        &self,
        coordinate: &Coordinate,
        scope: Scope,
        dependencies: &[DependencyDescriptor],
    ) -> Result<(), CacheError> {
        let path = self.entry_path(coordinate, scope);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::io("failed to create solutions directory", parent, e))?;
        }

        let file = File::create(&path)
            .map_err(|e| CacheError::io("failed to create cached solution", &path, e))?;
        let mut writer = BufWriter::new(file);

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let header = SolutionHeader {
            version: SOLUTION_VERSION,
            created_at: now,
        };

        bincode::serialize_into(&mut writer, &header)?;
        bincode::serialize_into(&mut writer, dependencies)?;

        info!(
            "Cached solution for {} [{}] with {} dependencies",
            coordinate,
            scope,
            dependencies.len()
        );

        Ok(())
    }

    /// Drop all cached solutions.
    pub fn clear(&self) -> Result<(), CacheError> {
        let dir = self.root.join(SOLUTIONS_DIR);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .map_err(|e| CacheError::io("failed to clear solution cache", &dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mortar_core::DependencyDescriptor;
    use tempfile::tempdir;

    fn root() -> Coordinate {
        Coordinate::new("org.example", "app", "1.0")
    }

    fn solution() -> Vec<DependencyDescriptor> {
        vec![
            DependencyDescriptor::declared(
                Coordinate::new("com.x", "core", "1.0"),
                Scope::Compile,
            ),
            DependencyDescriptor::declared(
                Coordinate::new("com.y", "util", "2.0"),
                Scope::Runtime,
            ),
        ]
    }

    #[test]
    fn test_save_and_load() {
        let temp = tempdir().unwrap();
        let cache = SolutionCache::new(temp.path());

        assert!(cache.load(&root(), Scope::Compile).unwrap().is_none());

        cache.save(&root(), Scope::Compile, &solution()).unwrap();
        let loaded = cache.load(&root(), Scope::Compile).unwrap().unwrap();

        assert_eq!(loaded, solution());
    }

    #[test]
    fn test_scopes_are_separate_entries() {
        let temp = tempdir().unwrap();
        let cache = SolutionCache::new(temp.path());

        cache.save(&root(), Scope::Compile, &solution()).unwrap();
        assert!(cache.load(&root(), Scope::Test).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let temp = tempdir().unwrap();
        let cache = SolutionCache::new(temp.path());

        cache.save(&root(), Scope::Compile, &solution()).unwrap();
        cache.clear().unwrap();
        assert!(cache.load(&root(), Scope::Compile).unwrap().is_none());
    }
}
