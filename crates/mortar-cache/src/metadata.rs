//! Per-coordinate freshness records.
//!
//! Each coordinate the solver has seen gets one JSON record persisted in
//! the records root, surviving process restarts. The record gates whether
//! a network refresh is needed: a metadata fetch is skipped whenever the
//! coordinate was checked within the policy interval, except when the
//! policy is `always` or no record exists yet.

use chrono::{DateTime, Duration, Utc};
use mortar_core::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::trace;

use crate::layout;
use crate::CacheError;

/// How often cached remote facts are re-validated against the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Once a record exists it is always considered fresh.
    Never,
    /// Fresh if checked within the last 24 hours.
    Daily,
    /// Never fresh; every resolution re-queries remote metadata.
    Always,
}

impl UpdatePolicy {
    /// Clamp for snapshot coordinates, which are mutable and re-checked at
    /// least daily regardless of the configured policy.
    pub fn at_least_daily(&self) -> UpdatePolicy {
        match self {
            UpdatePolicy::Never => UpdatePolicy::Daily,
            other => *other,
        }
    }

    /// Read the default policy from the environment, falling back to daily.
    pub fn from_env() -> UpdatePolicy {
        std::env::var(mortar_core::EnvVars::MORTAR_UPDATE_POLICY)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        UpdatePolicy::Daily
    }
}

impl fmt::Display for UpdatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdatePolicy::Never => "never",
            UpdatePolicy::Daily => "daily",
            UpdatePolicy::Always => "always",
        };
        f.write_str(name)
    }
}

impl FromStr for UpdatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(UpdatePolicy::Never),
            "daily" => Ok(UpdatePolicy::Daily),
            "always" => Ok(UpdatePolicy::Always),
            other => Err(format!("unknown update policy: {}", other)),
        }
    }
}

/// Freshness facts for one coordinate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// When remote metadata was last checked.
    pub last_checked: Option<DateTime<Utc>>,
    /// When the cached copy was last updated from remote.
    pub last_updated: Option<DateTime<Utc>>,
    /// When a resolution rooted at this coordinate last completed.
    pub last_solved: Option<DateTime<Utc>>,
    /// Per-coordinate policy override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_policy: Option<UpdatePolicy>,
}

impl MetadataRecord {
    /// Whether this record is fresh under `policy` at time `now`.
    pub fn is_fresh(&self, policy: UpdatePolicy, now: DateTime<Utc>) -> bool {
        match policy {
            UpdatePolicy::Always => false,
            UpdatePolicy::Never => self.last_checked.is_some(),
            UpdatePolicy::Daily => self
                .last_checked
                .is_some_and(|checked| now - checked < Duration::hours(24)),
        }
    }
}

/// The persistent store of freshness records.
pub struct MetadataStore {
    root: PathBuf,
    policy: UpdatePolicy,
    online: bool,
}

impl MetadataStore {
    pub fn new(root: impl Into<PathBuf>, policy: UpdatePolicy, online: bool) -> Self {
        Self {
            root: root.into(),
            policy,
            online,
        }
    }

    /// Open a store using the environment-configured default policy and
    /// the process-wide online switch.
    pub fn from_env(root: impl Into<PathBuf>) -> Self {
        Self::new(root, UpdatePolicy::from_env(), mortar_core::env::online())
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.policy
    }

    fn record_file(&self, coordinate: &Coordinate) -> PathBuf {
        self.root.join(layout::record_path(coordinate))
    }

    /// Load the record for a coordinate, if one exists.
    pub fn load(&self, coordinate: &Coordinate) -> Result<Option<MetadataRecord>, CacheError> {
        let path = self.record_file(coordinate);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| CacheError::io("failed to read freshness record", &path, e))?;
        let record = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    fn save(&self, coordinate: &Coordinate, record: &MetadataRecord) -> Result<(), CacheError> {
        let path = self.record_file(coordinate);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::io("failed to create records directory", parent, e))?;
        }
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&path, content)
            .map_err(|e| CacheError::io("failed to write freshness record", &path, e))?;
        Ok(())
    }

    /// Whether remote metadata for this coordinate should be re-queried.
    ///
    /// Always `false` when the process is offline. Snapshot coordinates
    /// are clamped to at least the daily policy.
    pub fn should_refresh(&self, coordinate: &Coordinate) -> bool {
        if !self.online {
            return false;
        }

        let record = match self.load(coordinate) {
            Ok(Some(record)) => record,
            Ok(None) => return true,
            Err(_) => return true,
        };

        let mut policy = record.update_policy.unwrap_or(self.policy);
        if coordinate.is_snapshot() {
            policy = policy.at_least_daily();
        }

        let refresh = !record.is_fresh(policy, Utc::now());
        trace!(
            "Freshness check for {}: policy {}, refresh {}",
            coordinate, policy, refresh
        );
        refresh
    }

    fn touch(
        &self,
        coordinate: &Coordinate,
        apply: impl FnOnce(&mut MetadataRecord),
    ) -> Result<(), CacheError> {
        let mut record = self.load(coordinate)?.unwrap_or_default();
        apply(&mut record);
        self.save(coordinate, &record)
    }

    /// Record that remote metadata was checked for this coordinate.
    pub fn record_checked(&self, coordinate: &Coordinate) -> Result<(), CacheError> {
        self.touch(coordinate, |r| r.last_checked = Some(Utc::now()))
    }

    /// Record that the cached copy was updated from remote.
    pub fn record_updated(&self, coordinate: &Coordinate) -> Result<(), CacheError> {
        self.touch(coordinate, |r| {
            let now = Utc::now();
            r.last_checked = Some(now);
            r.last_updated = Some(now);
        })
    }

    /// Record that a resolution rooted at this coordinate completed.
    pub fn record_solved(&self, coordinate: &Coordinate) -> Result<(), CacheError> {
        self.touch(coordinate, |r| r.last_solved = Some(Utc::now()))
    }

    /// When a resolution rooted at this coordinate last completed.
    pub fn last_solved(&self, coordinate: &Coordinate) -> Option<DateTime<Utc>> {
        self.load(coordinate).ok().flatten().and_then(|r| r.last_solved)
    }
}
