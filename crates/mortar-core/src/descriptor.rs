//! Dependency descriptors: one declared or discovered coordinate edge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::coordinate::{ArtifactKey, Coordinate, CoordinateParseError};
use crate::scope::Scope;

/// Ring of dependencies declared directly by the root project.
pub const DIRECT_RING: u32 = 1;

/// An exclusion pattern suppressing transitive pull-in of matching
/// coordinates below the declaring dependency. `*` wildcards either side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn matches(&self, key: &ArtifactKey) -> bool {
        (self.group_id == "*" || self.group_id == key.group_id)
            && (self.artifact_id == "*" || self.artifact_id == key.artifact_id)
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for Exclusion {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((group, artifact)) if !group.is_empty() && !artifact.is_empty() => {
                Ok(Exclusion::new(group, artifact))
            }
            _ => Err(CoordinateParseError::InvalidFormat(s.to_string())),
        }
    }
}

/// One coordinate edge in the dependency graph.
///
/// `ring` is the hop distance from the root project: 1 for directly declared
/// dependencies, N for dependencies discovered N-1 hops into the transitive
/// closure. A descriptor reached via two paths keeps the smallest ring it
/// was ever discovered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub coordinate: Coordinate,
    /// Effective scope after propagation rules.
    pub scope: Scope,
    /// Scope as written in the declaring project, before propagation.
    pub defined_scope: Scope,
    pub ring: u32,
    // No skip_serializing_if on any field: descriptors round-trip through
    // bincode in the solution cache, which cannot tolerate omitted fields.
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub optional: bool,
    /// Free-form labels used for selective export of ring-1 declarations.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Direct filesystem path for system-scoped dependencies.
    #[serde(default)]
    pub system_path: Option<PathBuf>,
}

impl DependencyDescriptor {
    /// A directly declared (ring 1) descriptor.
    pub fn declared(coordinate: Coordinate, scope: Scope) -> Self {
        Self {
            coordinate,
            scope,
            defined_scope: scope,
            ring: DIRECT_RING,
            exclusions: Vec::new(),
            optional: false,
            tags: Vec::new(),
            system_path: None,
        }
    }

    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into().to_lowercase());
        self
    }

    pub fn with_system_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.system_path = Some(path.into());
        self
    }

    pub fn key(&self) -> ArtifactKey {
        self.coordinate.key()
    }

    /// Whether this descriptor's own exclusion list suppresses `key`.
    pub fn excludes(&self, key: &ArtifactKey) -> bool {
        self.exclusions.iter().any(|e| e.matches(key))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| *t == tag)
    }

    /// Whether this descriptor was declared by the root project itself.
    pub fn is_direct(&self) -> bool {
        self.ring == DIRECT_RING
    }
}

impl fmt::Display for DependencyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, ring {}]", self.coordinate, self.scope, self.ring)
    }
}
