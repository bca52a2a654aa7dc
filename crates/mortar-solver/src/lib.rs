//! Dependency solver for mortar.
//!
//! This crate provides:
//! - The repository client (ordered endpoints, retry and failover, offline
//!   gating, version-marker metadata)
//! - Per-coordinate single-flight fetch deduplication
//! - The warehouse provider fusing the tiered cache, the repository client
//!   and the freshness records
//! - The breadth-first, ring-counting dependency solver
//!
//! # Example
//!
//! ```ignore
//! use mortar_core::Scope;
//! use mortar_solver::{Solver, Warehouse};
//!
//! let warehouse = Warehouse::new(cache, records, client, parser);
//! let solver = Solver::new(&warehouse);
//!
//! let resolution = solver.solve(&pom, Scope::Compile).await?;
//! for dependency in resolution.iter() {
//!     let path = warehouse.materialize(dependency).await?;
//!     println!("{} -> {}", dependency, path.display());
//! }
//! ```

pub mod flight;
pub mod provider;
pub mod repository;
pub mod resolver;

pub use flight::Flight;
pub use provider::{MemoryProvider, PomProvider, Warehouse};
pub use repository::{ClientOptions, RemoteMetadata, RepoError, Repository, RepositoryClient};
pub use resolver::{Resolution, SolveError, SolveOptions, Solver};
