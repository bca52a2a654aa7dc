//! Version ordering and range markers.
//!
//! Versions are dotted numeric components with an optional trailing
//! qualifier (`1.2.3`, `2.0-rc1`, `1.5-SNAPSHOT`). Ordering compares the
//! numeric components first; a qualified version sorts below its unqualified
//! form, so `2.0` is newer than `2.0-rc1`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::coordinate::SNAPSHOT_SUFFIX;

/// A parsed version used to pick the newest entry in repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    /// Numeric components (e.g., `[1, 2, 3]` for "1.2.3").
    pub components: Vec<u32>,
    /// Trailing qualifier after the first dash, if any (e.g., "rc1").
    pub qualifier: Option<String>,
}

impl Version {
    pub fn new(components: Vec<u32>) -> Self {
        Self {
            components,
            qualifier: None,
        }
    }

    /// Whether the qualifier marks this as a snapshot version.
    pub fn is_snapshot(&self) -> bool {
        self.qualifier
            .as_deref()
            .is_some_and(|q| q.eq_ignore_ascii_case("SNAPSHOT"))
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (numeric, qualifier) = match s.split_once('-') {
            Some((numeric, qualifier)) => (numeric, Some(qualifier.to_string())),
            None => (s, None),
        };

        let components: Result<Vec<u32>, _> =
            numeric.split('.').map(|c| c.parse::<u32>()).collect();

        match components {
            Ok(c) if c.is_empty() => Err(VersionParseError::Empty),
            Ok(components) => Ok(Version {
                components,
                qualifier,
            }),
            Err(_) => Err(VersionParseError::InvalidComponent(s.to_string())),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("."))?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "-{}", qualifier)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare component by component, treating missing trailing
        // components as zero so 1.2 == 1.2.0.
        let max_len = self.components.len().max(other.components.len());
        for i in 0..max_len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }

        // Unqualified sorts above qualified at the same numeric level.
        match (&self.qualifier, &other.qualifier) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Error parsing a version string.
#[derive(Debug, Clone, Error)]
pub enum VersionParseError {
    #[error("empty version string")]
    Empty,
    #[error("invalid version component: {0}")]
    InvalidComponent(String),
}

/// A symbolic version token resolved against repository metadata before
/// the coordinate participates in conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionMarker {
    /// Newest non-snapshot version.
    Release,
    /// Newest version overall, snapshots included.
    Latest,
}

impl VersionMarker {
    /// Recognize the `RELEASE`/`LATEST` tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "RELEASE" => Some(VersionMarker::Release),
            "LATEST" => Some(VersionMarker::Latest),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            VersionMarker::Release => "RELEASE",
            VersionMarker::Latest => "LATEST",
        }
    }

    /// Pick the matching version from a list of version strings, newest
    /// first by [`Version`] ordering. Unparseable entries are skipped.
    pub fn select<'a, I>(&self, versions: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        versions
            .into_iter()
            .filter_map(|raw| raw.parse::<Version>().ok().map(|v| (v, raw)))
            .filter(|(v, raw)| match self {
                VersionMarker::Release => !v.is_snapshot() && !raw.ends_with(SNAPSHOT_SUFFIX),
                VersionMarker::Latest => true,
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, raw)| raw.to_string())
    }
}

impl fmt::Display for VersionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
