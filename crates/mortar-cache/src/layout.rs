//! On-disk cache layout.
//!
//! Both cache tiers use the same Maven2-compatible layout:
//! `{groupId-as-path}/{artifactId}/{version}/{artifactId}-{version}[-{classifier}].{ext}`
//! with repository metadata mirrored per artifact as
//! `{groupId-as-path}/{artifactId}/metadata.xml`.

use mortar_core::{ArtifactKey, Coordinate};
use std::path::PathBuf;

/// Fixed per-artifact metadata file name.
pub const METADATA_FILE: &str = "metadata.xml";

/// Fixed per-coordinate freshness record file name.
pub const RECORD_FILE: &str = "record.json";

/// Relative path of an artifact within a cache tier.
pub fn artifact_path(coordinate: &Coordinate, extension: &str) -> PathBuf {
    PathBuf::from(coordinate.group_as_path())
        .join(&coordinate.artifact_id)
        .join(&coordinate.version)
        .join(coordinate.file_name(extension))
}

/// Relative path of the mirrored repository metadata for an artifact.
pub fn metadata_path(key: &ArtifactKey) -> PathBuf {
    PathBuf::from(key.group_id.replace('.', "/"))
        .join(&key.artifact_id)
        .join(METADATA_FILE)
}

/// Relative path of the freshness record for a coordinate.
pub fn record_path(coordinate: &Coordinate) -> PathBuf {
    PathBuf::from(coordinate.group_as_path())
        .join(&coordinate.artifact_id)
        .join(&coordinate.version)
        .join(RECORD_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path() {
        let c = Coordinate::new("org.example.deep", "widget", "1.2.3");
        assert_eq!(
            artifact_path(&c, "jar"),
            PathBuf::from("org/example/deep/widget/1.2.3/widget-1.2.3.jar")
        );
    }

    #[test]
    fn test_artifact_path_with_classifier() {
        let c = Coordinate::new("org.example", "widget", "1.2.3").with_classifier("sources");
        assert_eq!(
            artifact_path(&c, "jar"),
            PathBuf::from("org/example/widget/1.2.3/widget-1.2.3-sources.jar")
        );
    }

    #[test]
    fn test_metadata_path() {
        let key = ArtifactKey::new("org.example", "widget");
        assert_eq!(
            metadata_path(&key),
            PathBuf::from("org/example/widget/metadata.xml")
        );
    }

    #[test]
    fn test_record_path() {
        let c = Coordinate::new("org.example", "widget", "2.0");
        assert_eq!(
            record_path(&c),
            PathBuf::from("org/example/widget/2.0/record.json")
        );
    }
}
