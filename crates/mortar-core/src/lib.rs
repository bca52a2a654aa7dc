//! Shared dependency model for mortar.
//!
//! This crate provides the value types the solver and cache crates agree on:
//! - Artifact coordinates and conflict identities
//! - Version ordering and the `RELEASE`/`LATEST` range markers
//! - Dependency scopes with admission and propagation rules
//! - Dependency descriptors (ring, exclusions, tags)
//! - Project models with management overrides, aliases and inheritance

pub mod coordinate;
pub mod descriptor;
pub mod env;
pub mod pom;
pub mod scope;
pub mod version;

pub use coordinate::{
    ArtifactKey, Coordinate, CoordinateParseError, DEFAULT_EXTENSION, DESCRIPTOR_EXTENSION,
    SNAPSHOT_SUFFIX,
};
pub use descriptor::{DependencyDescriptor, Exclusion, DIRECT_RING};
pub use env::EnvVars;
pub use pom::{ManagedDependency, Pom};
pub use scope::{Scope, ScopeParseError};
pub use version::{Version, VersionMarker, VersionParseError};
