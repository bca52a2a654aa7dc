//! Project model providers.
//!
//! The solver walks the graph through the [`PomProvider`] seam: it asks for
//! project models and concrete versions and never touches the network or
//! filesystem itself. [`Warehouse`] is the production implementation fusing
//! the tiered artifact cache, the repository client and the freshness
//! records; [`MemoryProvider`] serves pre-loaded models for tests and
//! local-only resolution.

use async_trait::async_trait;
use mortar_cache::{ArtifactCache, MetadataStore, SolutionCache};
use mortar_core::{
    ArtifactKey, Coordinate, DependencyDescriptor, Pom, Scope, VersionMarker,
    DESCRIPTOR_EXTENSION,
};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::flight::Flight;
use crate::repository::{RemoteMetadata, RepositoryClient};
use crate::resolver::SolveError;

/// Maximum concurrent repository downloads per warehouse.
const DEFAULT_DOWNLOAD_JOBS: usize = 8;

/// Source of project models and concrete versions for the solver.
#[async_trait]
pub trait PomProvider: Send + Sync {
    /// Load the project model for a concrete coordinate.
    async fn project(&self, coordinate: &Coordinate) -> Result<Pom, SolveError>;

    /// Resolve a `RELEASE`/`LATEST` marker to a concrete version.
    async fn concrete_version(
        &self,
        coordinate: &Coordinate,
        marker: VersionMarker,
    ) -> Result<String, SolveError>;

    /// Record that a resolution rooted at `coordinate` completed.
    fn record_solved(&self, _coordinate: &Coordinate) {}
}

/// Callback turning fetched descriptor bytes into a typed model.
///
/// The declaration-language parser lives outside this crate; the warehouse
/// only moves bytes around.
pub type DescriptorParser = dyn Fn(&[u8], &Coordinate) -> Result<Pom, String> + Send + Sync;

/// The production provider: tiered cache in front of remote repositories,
/// gated by per-coordinate freshness records, with per-coordinate
/// single-flight fetch deduplication.
pub struct Warehouse {
    cache: Arc<ArtifactCache>,
    records: Arc<MetadataStore>,
    client: Arc<RepositoryClient>,
    solutions: SolutionCache,
    parser: Arc<DescriptorParser>,
    flights: Flight<Result<PathBuf, SolveError>>,
    downloads: Arc<Semaphore>,
}

impl Warehouse {
    pub fn new(
        cache: ArtifactCache,
        records: MetadataStore,
        client: RepositoryClient,
        parser: impl Fn(&[u8], &Coordinate) -> Result<Pom, String> + Send + Sync + 'static,
    ) -> Self {
        let solutions = SolutionCache::new(cache.root());
        Self {
            cache: Arc::new(cache),
            records: Arc::new(records),
            client: Arc::new(client),
            solutions,
            parser: Arc::new(parser),
            flights: Flight::new(),
            downloads: Arc::new(Semaphore::new(DEFAULT_DOWNLOAD_JOBS)),
        }
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn records(&self) -> &MetadataStore {
        &self.records
    }

    /// Resolve a descriptor to a physical file, fetching into the primary
    /// cache tier on a miss. System-scoped descriptors short-circuit to
    /// their declared path.
    pub async fn materialize(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> Result<PathBuf, SolveError> {
        if let Some(path) = &descriptor.system_path {
            return Ok(path.clone());
        }
        let extension = descriptor.coordinate.extension.clone();
        self.locate_or_fetch(&descriptor.coordinate, &extension).await
    }

    /// Load a previously persisted solution for a root coordinate.
    pub fn cached_solution(
        &self,
        coordinate: &Coordinate,
        scope: Scope,
    ) -> Option<Vec<DependencyDescriptor>> {
        self.solutions.load(coordinate, scope).ok().flatten()
    }

    /// Persist a solved dependency set for a root coordinate.
    pub fn store_solution(
        &self,
        coordinate: &Coordinate,
        scope: Scope,
        dependencies: &[DependencyDescriptor],
    ) -> Result<(), SolveError> {
        self.solutions
            .save(coordinate, scope, dependencies)
            .map_err(|e| SolveError::cache(coordinate, &e))
    }

    /// Locate an artifact in the cache tiers, or fetch it into the primary
    /// tier. Snapshot coordinates with a due freshness check are re-fetched
    /// even when cached; if that refresh fails the cached copy is kept.
    async fn locate_or_fetch(
        &self,
        coordinate: &Coordinate,
        extension: &str,
    ) -> Result<PathBuf, SolveError> {
        let cached = self
            .cache
            .locate(coordinate, extension)
            .map_err(|e| SolveError::cache(coordinate, &e))?;

        if let Some(path) = &cached
            && !(coordinate.is_snapshot() && self.records.should_refresh(coordinate))
        {
            return Ok(path.clone());
        }

        let key = format!("{}@{}", coordinate, extension);
        let cache = Arc::clone(&self.cache);
        let records = Arc::clone(&self.records);
        let client = Arc::clone(&self.client);
        let downloads = Arc::clone(&self.downloads);
        let flight_coordinate = coordinate.clone();
        let flight_extension = extension.to_string();

        let outcome = self
            .flights
            .run(&key, async move {
                let _permit = downloads.acquire().await.unwrap();
                let bytes = client
                    .fetch_artifact(&flight_coordinate, &flight_extension)
                    .await
                    .map_err(|e| SolveError::network(&flight_coordinate, &e))?;
                let path = cache
                    .store(&flight_coordinate, &flight_extension, &bytes)
                    .map_err(|e| SolveError::cache(&flight_coordinate, &e))?;
                if let Err(e) = records.record_updated(&flight_coordinate) {
                    warn!("Failed to update freshness record for {}: {}", flight_coordinate, e);
                }
                Ok(path)
            })
            .await;

        match outcome {
            Ok(path) => Ok(path),
            Err(error) => {
                // A stale snapshot that fails to refresh falls back to the
                // cached copy rather than failing the branch.
                if let Some(path) = cached {
                    warn!("Using cached copy of {}: {}", coordinate, error);
                    return Ok(path);
                }
                Err(error)
            }
        }
    }

    /// Fetch-or-load the per-artifact metadata document, honoring the
    /// freshness policy, and mirror fresh copies into the cache.
    async fn metadata(&self, coordinate: &Coordinate) -> Result<RemoteMetadata, SolveError> {
        let key = coordinate.key();

        if self.records.should_refresh(coordinate) {
            let flight_key = format!("metadata:{}", key);
            let cache = Arc::clone(&self.cache);
            let records = Arc::clone(&self.records);
            let client = Arc::clone(&self.client);
            let downloads = Arc::clone(&self.downloads);
            let flight_coordinate = coordinate.clone();
            let artifact_key = key.clone();

            let outcome = self
                .flights
                .run(&flight_key, async move {
                    let _permit = downloads.acquire().await.unwrap();
                    let bytes = client
                        .fetch_metadata(&artifact_key)
                        .await
                        .map_err(|e| SolveError::network(&flight_coordinate, &e))?;
                    let path = cache
                        .store_metadata(&artifact_key, &bytes)
                        .map_err(|e| SolveError::cache(&flight_coordinate, &e))?;
                    if let Err(e) = records.record_updated(&flight_coordinate) {
                        warn!(
                            "Failed to update freshness record for {}: {}",
                            flight_coordinate, e
                        );
                    }
                    Ok(path)
                })
                .await;

            match outcome {
                Ok(path) => {
                    let bytes = fs::read(&path).map_err(|e| {
                        SolveError::cache_io(coordinate, &path, &e)
                    })?;
                    return RemoteMetadata::parse(&key, &bytes)
                        .map_err(|e| SolveError::metadata(coordinate, e.to_string()));
                }
                Err(error) => {
                    debug!("Metadata refresh failed for {}: {}", key, error);
                    // Degrade to the cached last-known document below.
                }
            }
        }

        match self.cache.metadata(&key) {
            Some(path) => {
                let bytes = fs::read(&path)
                    .map_err(|e| SolveError::cache_io(coordinate, &path, &e))?;
                RemoteMetadata::parse(&key, &bytes)
                    .map_err(|e| SolveError::metadata(coordinate, e.to_string()))
            }
            None => Err(SolveError::metadata(
                coordinate,
                "no cached repository metadata and remote is unavailable",
            )),
        }
    }
}

#[async_trait]
impl PomProvider for Warehouse {
    async fn project(&self, coordinate: &Coordinate) -> Result<Pom, SolveError> {
        let path = self
            .locate_or_fetch(coordinate, DESCRIPTOR_EXTENSION)
            .await?;
        let bytes =
            fs::read(&path).map_err(|e| SolveError::cache_io(coordinate, &path, &e))?;
        (self.parser)(&bytes, coordinate)
            .map_err(|reason| SolveError::resolution(coordinate, reason))
    }

    async fn concrete_version(
        &self,
        coordinate: &Coordinate,
        marker: VersionMarker,
    ) -> Result<String, SolveError> {
        let metadata = self.metadata(coordinate).await?;
        metadata.concrete(marker).ok_or_else(|| {
            SolveError::metadata(
                coordinate,
                format!("metadata lists no version matching {}", marker),
            )
        })
    }

    fn record_solved(&self, coordinate: &Coordinate) {
        if let Err(e) = self.records.record_solved(coordinate) {
            warn!("Failed to record solve for {}: {}", coordinate, e);
        }
    }
}

/// A provider serving pre-loaded models, for tests and local-only solves.
#[derive(Default)]
pub struct MemoryProvider {
    poms: HashMap<(ArtifactKey, String), Pom>,
    metadata: HashMap<ArtifactKey, RemoteMetadata>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&mut self, pom: Pom) {
        let key = (pom.coordinate.key(), pom.coordinate.version.clone());
        self.poms.insert(key, pom);
    }

    pub fn add_metadata(&mut self, key: ArtifactKey, metadata: RemoteMetadata) {
        self.metadata.insert(key, metadata);
    }
}

#[async_trait]
impl PomProvider for MemoryProvider {
    async fn project(&self, coordinate: &Coordinate) -> Result<Pom, SolveError> {
        let key = (coordinate.key(), coordinate.version.clone());
        match self.poms.get(&key) {
            Some(pom) => Ok(pom.clone()),
            None => Err(SolveError::resolution(
                coordinate,
                "project descriptor not found",
            )),
        }
    }

    async fn concrete_version(
        &self,
        coordinate: &Coordinate,
        marker: VersionMarker,
    ) -> Result<String, SolveError> {
        let metadata = self.metadata.get(&coordinate.key()).ok_or_else(|| {
            SolveError::metadata(coordinate, "no repository metadata registered")
        })?;
        metadata.concrete(marker).ok_or_else(|| {
            SolveError::metadata(
                coordinate,
                format!("metadata lists no version matching {}", marker),
            )
        })
    }
}
