//! Artifact coordinates.
//!
//! A coordinate names one artifact in a repository:
//! `(groupId, artifactId, version, classifier?, extension)`. Two coordinates
//! that share `(groupId, artifactId)` but differ in version are conflicting,
//! not distinct; [`ArtifactKey`] is that conflict identity.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::version::VersionMarker;

/// Version suffix marking a mutable, re-checkable artifact.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Default artifact extension.
pub const DEFAULT_EXTENSION: &str = "jar";

/// Extension of project descriptor files.
pub const DESCRIPTOR_EXTENSION: &str = "pom";

/// Error parsing a coordinate string.
#[derive(Debug, Clone, Error)]
pub enum CoordinateParseError {
    #[error("invalid coordinate: {0} (expected group:artifact[:version[:classifier]][@ext])")]
    InvalidFormat(String),

    #[error("empty coordinate segment in: {0}")]
    EmptySegment(String),
}

/// The conflict identity of an artifact: `(groupId, artifactId)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub group_id: String,
    pub artifact_id: String,
}

impl ArtifactKey {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for ArtifactKey {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), None) if !group.is_empty() && !artifact.is_empty() => {
                Ok(ArtifactKey::new(group, artifact))
            }
            _ => Err(CoordinateParseError::InvalidFormat(s.to_string())),
        }
    }
}

// Keys serialize as "group:artifact" so they can index JSON maps.
impl Serialize for ArtifactKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArtifactKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// A fully qualified artifact coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    // No skip_serializing_if here: these types round-trip through bincode,
    // which cannot tolerate omitted fields.
    #[serde(default)]
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinate {
    /// Create a coordinate with the default `jar` extension.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The `(groupId, artifactId)` conflict identity.
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(self.group_id.clone(), self.artifact_id.clone())
    }

    /// Group id with dots mapped to path separators, for on-disk layout.
    pub fn group_as_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Whether the version carries the mutable `-SNAPSHOT` suffix.
    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX)
    }

    /// The version-range marker, if the version is `RELEASE` or `LATEST`.
    pub fn marker(&self) -> Option<VersionMarker> {
        VersionMarker::from_token(&self.version)
    }

    /// File name of this artifact for the given extension:
    /// `{artifactId}-{version}[-{classifier}].{ext}`.
    pub fn file_name(&self, extension: &str) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, classifier, extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, extension),
        }
    }

    /// The companion sources artifact for this coordinate.
    pub fn sources(&self) -> Coordinate {
        self.clone().with_classifier("sources").with_extension("jar")
    }

    /// The companion javadoc artifact for this coordinate.
    pub fn javadoc(&self) -> Coordinate {
        self.clone().with_classifier("javadoc").with_extension("jar")
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Coordinate::new("", "", "")
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        if self.extension != DEFAULT_EXTENSION {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    /// Parse `group:artifact:version[:classifier][@ext]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (spec, extension) = match s.rsplit_once('@') {
            Some((spec, ext)) if !ext.is_empty() => (spec, ext.to_string()),
            Some(_) => return Err(CoordinateParseError::EmptySegment(s.to_string())),
            None => (s, DEFAULT_EXTENSION.to_string()),
        };

        let segments: Vec<&str> = spec.split(':').collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(CoordinateParseError::EmptySegment(s.to_string()));
        }

        match segments.as_slice() {
            [group, artifact, version] => Ok(Coordinate {
                group_id: group.to_string(),
                artifact_id: artifact.to_string(),
                version: version.to_string(),
                classifier: None,
                extension,
            }),
            [group, artifact, version, classifier] => Ok(Coordinate {
                group_id: group.to_string(),
                artifact_id: artifact.to_string(),
                version: version.to_string(),
                classifier: Some(classifier.to_string()),
                extension,
            }),
            _ => Err(CoordinateParseError::InvalidFormat(s.to_string())),
        }
    }
}
