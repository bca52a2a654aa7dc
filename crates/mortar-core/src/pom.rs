//! Project models.
//!
//! A [`Pom`] is the fully-typed model of one project descriptor, produced by
//! the configuration parser before resolution starts. The solver reads it
//! and never mutates it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::coordinate::{ArtifactKey, Coordinate};
use crate::descriptor::DependencyDescriptor;
use crate::scope::Scope;

/// A version/scope override forced onto any descriptor matching its
/// `(groupId, artifactId)` key, regardless of the declared version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDependency {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl ManagedDependency {
    pub fn version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// A project's own coordinate, declarations, overrides and lineage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pom {
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Declared dependencies, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<DependencyDescriptor>,
    /// Version/scope overrides applied to matching transitive descriptors.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dependency_management: HashMap<ArtifactKey, ManagedDependency>,
    /// Coordinate rewrite table (deprecated artifact -> replacement).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dependency_aliases: HashMap<ArtifactKey, Coordinate>,
    /// Parent model for single inheritance; the child always wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Pom>>,
    /// Sibling module projects whose declarations join this project's solve.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_projects: Vec<Coordinate>,
}

impl Pom {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: Pom) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn add_dependency(&mut self, descriptor: DependencyDescriptor) {
        self.dependencies.push(descriptor);
    }

    pub fn manage(&mut self, key: ArtifactKey, managed: ManagedDependency) {
        self.dependency_management.insert(key, managed);
    }

    pub fn alias(&mut self, deprecated: ArtifactKey, replacement: Coordinate) {
        self.dependency_aliases.insert(deprecated, replacement);
    }

    pub fn link(&mut self, module: Coordinate) {
        self.linked_projects.push(module);
    }

    /// All declared dependencies, own first, then inherited declarations not
    /// shadowed by an own declaration with the same key.
    pub fn declared(&self) -> Vec<&DependencyDescriptor> {
        let mut out: Vec<&DependencyDescriptor> = self.dependencies.iter().collect();
        let mut ancestor = self.parent.as_deref();
        while let Some(pom) = ancestor {
            for dep in &pom.dependencies {
                if !out.iter().any(|d| d.key() == dep.key()) {
                    out.push(dep);
                }
            }
            ancestor = pom.parent.as_deref();
        }
        out
    }

    /// Declared dependencies admitted for a resolution targeting `scope`.
    pub fn dependencies_for(&self, scope: Scope) -> Vec<&DependencyDescriptor> {
        self.declared()
            .into_iter()
            .filter(|d| scope.admits(d.defined_scope))
            .collect()
    }

    /// Ring-1 declarations carrying any of the given tags.
    pub fn dependencies_tagged(&self, tags: &[&str]) -> Vec<&DependencyDescriptor> {
        self.declared()
            .into_iter()
            .filter(|d| d.is_direct() && tags.iter().any(|t| d.has_tag(t)))
            .collect()
    }

    /// Managed override for `key`: own table first, then the parent chain.
    pub fn managed(&self, key: &ArtifactKey) -> Option<&ManagedDependency> {
        if let Some(managed) = self.dependency_management.get(key) {
            return Some(managed);
        }
        let mut ancestor = self.parent.as_deref();
        while let Some(pom) = ancestor {
            if let Some(managed) = pom.dependency_management.get(key) {
                return Some(managed);
            }
            ancestor = pom.parent.as_deref();
        }
        None
    }

    /// Alias rewrite for `key`, looked up through the parent chain.
    pub fn alias_for(&self, key: &ArtifactKey) -> Option<&Coordinate> {
        if let Some(replacement) = self.dependency_aliases.get(key) {
            return Some(replacement);
        }
        let mut ancestor = self.parent.as_deref();
        while let Some(pom) = ancestor {
            if let Some(replacement) = pom.dependency_aliases.get(key) {
                return Some(replacement);
            }
            ancestor = pom.parent.as_deref();
        }
        None
    }
}
