//! The dependency solver.
//!
//! Resolution is a breadth-first walk over an explicit worklist of
//! `(descriptor, inherited exclusions)` items, one ring at a time, starting
//! from the root project's direct declarations. Each ring's project models
//! are fetched concurrently through the provider; updates to the accepted
//! set happen single-threaded between rings, so the output ordering is
//! deterministic for a fixed cache and repository state.

use futures::stream::{self, StreamExt};
use mortar_core::{
    ArtifactKey, Coordinate, DependencyDescriptor, Exclusion, Pom, Scope, DIRECT_RING,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::provider::PomProvider;
use crate::repository::RepoError;
use mortar_cache::CacheError;

/// Error type for resolution failures.
#[derive(Debug, Clone, Error)]
pub enum SolveError {
    #[error(
        "could not resolve {coordinate}{}: {reason}\n\n  Suggestions:\n    - Check that the coordinate exists in a configured repository\n    - Run with the network enabled to fetch missing artifacts",
        scope_note(.scope)
    )]
    Resolution {
        coordinate: String,
        scope: Option<Scope>,
        reason: String,
    },

    #[error("linked project cycle detected: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("version marker resolution failed for {coordinate}: {reason}")]
    Metadata { coordinate: String, reason: String },

    #[error("cache failure for {coordinate}: {reason}")]
    Cache { coordinate: String, reason: String },

    #[error("every repository failed for {coordinate}: {reason}")]
    Network { coordinate: String, reason: String },
}

fn scope_note(scope: &Option<Scope>) -> String {
    match scope {
        Some(scope) => format!(" [{}]", scope),
        None => String::new(),
    }
}

impl SolveError {
    pub fn resolution(coordinate: &Coordinate, reason: impl Into<String>) -> Self {
        SolveError::Resolution {
            coordinate: coordinate.to_string(),
            scope: None,
            reason: reason.into(),
        }
    }

    pub fn metadata(coordinate: &Coordinate, reason: impl Into<String>) -> Self {
        SolveError::Metadata {
            coordinate: coordinate.to_string(),
            reason: reason.into(),
        }
    }

    pub fn cache(coordinate: &Coordinate, error: &CacheError) -> Self {
        SolveError::Cache {
            coordinate: coordinate.to_string(),
            reason: error.to_string(),
        }
    }

    pub fn cache_io(coordinate: &Coordinate, path: &Path, error: &std::io::Error) -> Self {
        SolveError::Cache {
            coordinate: coordinate.to_string(),
            reason: format!("{}: {}", path.display(), error),
        }
    }

    /// Map a repository failure. Offline short-circuits are reported as
    /// unresolvable coordinates; endpoint exhaustion keeps its detail.
    pub fn network(coordinate: &Coordinate, error: &RepoError) -> Self {
        match error {
            RepoError::Offline => SolveError::Resolution {
                coordinate: coordinate.to_string(),
                scope: None,
                reason: "not cached locally and mortar is offline".to_string(),
            },
            other => SolveError::Network {
                coordinate: coordinate.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Attach the target scope to errors that carry one.
    pub fn with_scope(mut self, target: Scope) -> Self {
        if let SolveError::Resolution { scope, .. } = &mut self
            && scope.is_none()
        {
            *scope = Some(target);
        }
        self
    }
}

/// Configuration for the solver.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Abort the whole solve on the first branch failure instead of
    /// pruning the branch and continuing.
    pub strict: bool,
    /// Maximum concurrent provider fetches within one ring.
    pub jobs: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            strict: false,
            jobs: 8,
        }
    }
}

/// A per-scope resolved dependency set.
///
/// `dependencies` is ordered by resolution discovery order, never
/// alphabetically, because declaration order affects classpath precedence
/// for consumers. No two entries share a `(groupId, artifactId)` key.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub scope: Scope,
    pub dependencies: Vec<DependencyDescriptor>,
    /// Branch failures recorded in best-effort mode.
    pub failures: Vec<SolveError>,
}

impl Resolution {
    pub fn get(&self, key: &ArtifactKey) -> Option<&DependencyDescriptor> {
        self.dependencies.iter().find(|d| d.key() == *key)
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyDescriptor> {
        self.dependencies.iter()
    }
}

/// One worklist entry: a descriptor plus the exclusions accumulated along
/// its branch (ancestor exclusions plus its own).
#[derive(Debug, Clone)]
struct WorkItem {
    descriptor: DependencyDescriptor,
    exclusions: Vec<Exclusion>,
}

impl WorkItem {
    /// A ring-1 item from a direct declaration.
    fn direct(declared: &DependencyDescriptor) -> Self {
        let mut descriptor = declared.clone();
        descriptor.ring = DIRECT_RING;
        descriptor.scope = descriptor.defined_scope;
        Self {
            exclusions: descriptor.exclusions.clone(),
            descriptor,
        }
    }
}

/// The dependency solver.
pub struct Solver<'a> {
    provider: &'a dyn PomProvider,
    options: SolveOptions,
}

impl<'a> Solver<'a> {
    pub fn new(provider: &'a dyn PomProvider) -> Self {
        Self {
            provider,
            options: SolveOptions::default(),
        }
    }

    pub fn with_options(provider: &'a dyn PomProvider, options: SolveOptions) -> Self {
        Self { provider, options }
    }

    /// Compute the resolved, conflict-free dependency set of `pom` for the
    /// given target scope.
    pub async fn solve(&self, pom: &Pom, scope: Scope) -> Result<Resolution, SolveError> {
        let mut failures = Vec::new();

        let ring_one = self.gather_ring_one(pom, scope, &mut failures).await?;
        debug!(
            "Solving {} [{}]: {} direct dependencies",
            pom.coordinate,
            scope,
            ring_one.len()
        );

        let mut accepted: Vec<DependencyDescriptor> = Vec::new();
        let mut index: HashMap<ArtifactKey, usize> = HashMap::new();
        let mut frontier = ring_one;

        while !frontier.is_empty() {
            let prepared = self.prepare(frontier, pom, scope, &mut failures).await?;

            // Conflict resolution. The walk is breadth-first, so the first
            // acceptance of a key is at its minimal ring; later arrivals
            // (equal or larger ring) are dropped, ties keeping the first
            // one discovered in traversal order.
            let mut expand: Vec<WorkItem> = Vec::new();
            for item in prepared {
                let key = item.descriptor.key();
                if let Some(&existing) = index.get(&key) {
                    trace!(
                        "Keeping {} over {} (ring {} <= {})",
                        accepted[existing].coordinate,
                        item.descriptor.coordinate,
                        accepted[existing].ring,
                        item.descriptor.ring
                    );
                    continue;
                }
                index.insert(key, accepted.len());
                accepted.push(item.descriptor.clone());
                if expands(item.descriptor.scope) {
                    expand.push(item);
                }
            }

            frontier = self.expand_ring(&expand, scope, &mut failures).await?;
        }

        self.provider.record_solved(&pom.coordinate);

        debug!(
            "Solved {} [{}]: {} dependencies, {} pruned branches",
            pom.coordinate,
            scope,
            accepted.len(),
            failures.len()
        );

        Ok(Resolution {
            scope,
            dependencies: accepted,
            failures,
        })
    }

    /// Collect ring-1 declarations from the root project and its linked
    /// modules, detecting project-to-project cycles via the active chain.
    async fn gather_ring_one(
        &self,
        pom: &Pom,
        scope: Scope,
        failures: &mut Vec<SolveError>,
    ) -> Result<Vec<WorkItem>, SolveError> {
        let root_label = pom.coordinate.to_string();
        let mut ring_one: Vec<WorkItem> = pom
            .dependencies_for(scope)
            .into_iter()
            .map(WorkItem::direct)
            .collect();

        let mut visited: HashSet<String> = HashSet::from([root_label.clone()]);
        let mut pending: Vec<(Coordinate, Vec<String>)> = pom
            .linked_projects
            .iter()
            .rev()
            .map(|c| (c.clone(), vec![root_label.clone()]))
            .collect();

        while let Some((coordinate, chain)) = pending.pop() {
            let label = coordinate.to_string();

            if chain.contains(&label) {
                let mut cycle = chain;
                cycle.push(label);
                return Err(SolveError::Cycle { chain: cycle });
            }
            if !visited.insert(label.clone()) {
                // Diamond-shaped links are fine; only true cycles are fatal.
                continue;
            }

            match self.provider.project(&coordinate).await {
                Ok(module) => {
                    ring_one.extend(module.dependencies_for(scope).into_iter().map(WorkItem::direct));
                    let mut chain = chain;
                    chain.push(label);
                    for sub in module.linked_projects.iter().rev() {
                        pending.push((sub.clone(), chain.clone()));
                    }
                }
                Err(error) => {
                    let error = error.with_scope(scope);
                    if self.options.strict {
                        return Err(error);
                    }
                    warn!("Skipping linked project {}: {}", label, error);
                    failures.push(error);
                }
            }
        }

        Ok(ring_one)
    }

    /// Apply alias rewriting, dependency-management overrides and version
    /// marker resolution to a frontier, preserving its order. Overrides are
    /// looked up in the root model chain only, so the root's managed
    /// version wins over anything declared deeper in the tree.
    async fn prepare(
        &self,
        mut items: Vec<WorkItem>,
        root: &Pom,
        scope: Scope,
        failures: &mut Vec<SolveError>,
    ) -> Result<Vec<WorkItem>, SolveError> {
        for item in items.iter_mut() {
            let descriptor = &mut item.descriptor;

            if let Some(replacement) = root.alias_for(&descriptor.key()) {
                debug!("Aliasing {} -> {}", descriptor.coordinate, replacement);
                descriptor.coordinate.group_id = replacement.group_id.clone();
                descriptor.coordinate.artifact_id = replacement.artifact_id.clone();
                if !replacement.version.is_empty() {
                    descriptor.coordinate.version = replacement.version.clone();
                }
            }

            if let Some(managed) = root.managed(&descriptor.key()) {
                if descriptor.coordinate.version != managed.version {
                    debug!(
                        "Managing {} to version {}",
                        descriptor.coordinate, managed.version
                    );
                    descriptor.coordinate.version = managed.version.clone();
                }
                if let Some(managed_scope) = managed.scope {
                    descriptor.scope = managed_scope;
                }
            }
        }

        // Resolve RELEASE/LATEST markers concurrently before the items
        // participate in conflict resolution.
        let requests: Vec<(usize, Coordinate, mortar_core::VersionMarker)> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                item.descriptor
                    .coordinate
                    .marker()
                    .map(|marker| (i, item.descriptor.coordinate.clone(), marker))
            })
            .collect();

        if !requests.is_empty() {
            let provider = self.provider;
            let resolved: Vec<(usize, Result<String, SolveError>)> = stream::iter(
                requests.into_iter().map(|(i, coordinate, marker)| async move {
                    (i, provider.concrete_version(&coordinate, marker).await)
                }),
            )
            .buffered(self.options.jobs.max(1))
            .collect()
            .await;

            let mut dropped: HashSet<usize> = HashSet::new();
            for (i, outcome) in resolved {
                match outcome {
                    Ok(version) => {
                        trace!(
                            "Resolved {} to version {}",
                            items[i].descriptor.coordinate, version
                        );
                        items[i].descriptor.coordinate.version = version;
                    }
                    Err(error) => {
                        let error = error.with_scope(scope);
                        if self.options.strict {
                            return Err(error);
                        }
                        warn!(
                            "Dropping {}: {}",
                            items[i].descriptor.coordinate, error
                        );
                        failures.push(error);
                        dropped.insert(i);
                    }
                }
            }

            if !dropped.is_empty() {
                items = items
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| !dropped.contains(i))
                    .map(|(_, item)| item)
                    .collect();
            }
        }

        Ok(items)
    }

    /// Fetch the project models of the newly accepted items concurrently
    /// and build the next ring's worklist.
    async fn expand_ring(
        &self,
        expand: &[WorkItem],
        scope: Scope,
        failures: &mut Vec<SolveError>,
    ) -> Result<Vec<WorkItem>, SolveError> {
        let provider = self.provider;
        let models: Vec<Result<Pom, SolveError>> = stream::iter(
            expand
                .iter()
                .map(|item| {
                    let coordinate = item.descriptor.coordinate.clone();
                    async move { provider.project(&coordinate).await }
                }),
        )
        .buffered(self.options.jobs.max(1))
        .collect()
        .await;

        let mut next = Vec::new();
        for (item, outcome) in expand.iter().zip(models) {
            let model = match outcome {
                Ok(model) => model,
                Err(error) => {
                    let error = error.with_scope(scope);
                    if self.options.strict {
                        return Err(error);
                    }
                    warn!(
                        "Pruning branch under {}: {}",
                        item.descriptor.coordinate, error
                    );
                    failures.push(error);
                    continue;
                }
            };

            for child in model.declared() {
                let Some(effective) = item.descriptor.scope.propagates(child.defined_scope)
                else {
                    continue;
                };

                // Optional dependencies are not auto-pulled transitively.
                if child.optional {
                    trace!("Skipping optional {}", child.coordinate);
                    continue;
                }

                // Branch-local exclusions.
                let child_key = child.key();
                if item.exclusions.iter().any(|e| e.matches(&child_key)) {
                    trace!(
                        "Excluding {} under {}",
                        child.coordinate, item.descriptor.coordinate
                    );
                    continue;
                }

                let mut descriptor = child.clone();
                descriptor.ring = item.descriptor.ring + 1;
                descriptor.scope = effective;

                let mut exclusions = item.exclusions.clone();
                exclusions.extend(child.exclusions.iter().cloned());

                next.push(WorkItem {
                    descriptor,
                    exclusions,
                });
            }
        }

        Ok(next)
    }
}

/// Whether a dependency with this effective scope pulls children forward.
fn expands(scope: Scope) -> bool {
    matches!(scope, Scope::Compile | Scope::Runtime | Scope::Test)
}
