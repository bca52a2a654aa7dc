//! Environment variable constants for mortar.
//!
//! This module defines all environment variables that mortar recognizes,
//! providing a single source of truth for environment configuration.

/// Environment variable names used by mortar.
pub struct EnvVars;

impl EnvVars {
    /// Master network switch. Set to `false`/`0` to force offline mode for
    /// the whole process.
    pub const MORTAR_ONLINE: &'static str = "MORTAR_ONLINE";

    /// Root directory of the primary artifact cache.
    pub const MORTAR_CACHE_DIR: &'static str = "MORTAR_CACHE_DIR";

    /// Root of the foreign-format (Maven layout) secondary cache.
    pub const MORTAR_MAVEN_CACHE_DIR: &'static str = "MORTAR_MAVEN_CACHE_DIR";

    /// Default metadata update policy (`never`, `daily`, `always`).
    pub const MORTAR_UPDATE_POLICY: &'static str = "MORTAR_UPDATE_POLICY";

    /// Maximum parallel repository downloads.
    pub const MORTAR_JOBS: &'static str = "MORTAR_JOBS";

    /// Standard HOME environment variable.
    pub const HOME: &'static str = "HOME";
}

/// Read the process-wide online switch. Defaults to online; only an
/// explicit `false`, `0` or `off` disables network access.
pub fn online() -> bool {
    parse_online(std::env::var(EnvVars::MORTAR_ONLINE).ok().as_deref())
}

fn parse_online(value: Option<&str>) -> bool {
    match value {
        Some(value) => !matches!(value.to_lowercase().as_str(), "false" | "0" | "off"),
        None => true,
    }
}
