//! Dependency scopes and their propagation rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The declared usage context of a dependency.
///
/// Scope controls both which declared dependencies participate in a
/// resolution for a target scope, and which transitive children a resolved
/// dependency pulls forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compile,
    Runtime,
    Test,
    Provided,
    System,
    Site,
}

impl Scope {
    /// Compile is the default scope when none is declared.
    pub fn is_default(&self) -> bool {
        matches!(self, Scope::Compile)
    }

    /// Whether a ring-1 declaration with `declared` scope participates in a
    /// resolution targeting `self`.
    pub fn admits(&self, declared: Scope) -> bool {
        use Scope::*;
        match self {
            Compile => matches!(declared, Compile | Provided | System),
            Runtime => matches!(declared, Compile | Runtime),
            Test => matches!(declared, Compile | Provided | System | Runtime | Test),
            Provided => matches!(declared, Provided),
            System => matches!(declared, System),
            Site => matches!(declared, Site),
        }
    }

    /// The scope a transitive child is pulled forward with, given `self` as
    /// the parent's effective scope. `None` means the child is not pulled.
    ///
    /// Compile parents forward compile and runtime children unchanged;
    /// runtime parents forward only runtime children; test parents pull
    /// compile and runtime children into test. Provided, system and site
    /// dependencies are never expanded transitively, and test/provided/
    /// system/site children never propagate out of their declaring project.
    pub fn propagates(&self, child: Scope) -> Option<Scope> {
        use Scope::*;
        match (self, child) {
            (Compile, Compile) => Some(Compile),
            (Compile, Runtime) => Some(Runtime),
            (Runtime, Runtime) => Some(Runtime),
            (Test, Compile) | (Test, Runtime) => Some(Test),
            _ => None,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Compile
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::Provided => "provided",
            Scope::System => "system",
            Scope::Site => "site",
        };
        f.write_str(name)
    }
}

/// Error parsing a scope name.
#[derive(Debug, Clone, Error)]
#[error("unknown scope: {0}")]
pub struct ScopeParseError(String);

impl FromStr for Scope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Scope::Compile),
            "runtime" => Ok(Scope::Runtime),
            "test" => Ok(Scope::Test),
            "provided" => Ok(Scope::Provided),
            "system" => Ok(Scope::System),
            "site" => Ok(Scope::Site),
            other => Err(ScopeParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission() {
        assert!(Scope::Compile.admits(Scope::Compile));
        assert!(Scope::Compile.admits(Scope::Provided));
        assert!(!Scope::Compile.admits(Scope::Test));
        assert!(!Scope::Compile.admits(Scope::Runtime));

        assert!(Scope::Runtime.admits(Scope::Compile));
        assert!(Scope::Runtime.admits(Scope::Runtime));
        assert!(!Scope::Runtime.admits(Scope::Provided));

        assert!(Scope::Test.admits(Scope::Test));
        assert!(Scope::Test.admits(Scope::Compile));
        assert!(Scope::Test.admits(Scope::Runtime));
        assert!(!Scope::Test.admits(Scope::Site));

        assert!(Scope::Site.admits(Scope::Site));
        assert!(!Scope::Site.admits(Scope::Compile));
    }

    #[test]
    fn test_propagation() {
        assert_eq!(Scope::Compile.propagates(Scope::Compile), Some(Scope::Compile));
        assert_eq!(Scope::Compile.propagates(Scope::Runtime), Some(Scope::Runtime));
        assert_eq!(Scope::Compile.propagates(Scope::Test), None);

        assert_eq!(Scope::Runtime.propagates(Scope::Runtime), Some(Scope::Runtime));
        assert_eq!(Scope::Runtime.propagates(Scope::Compile), None);

        assert_eq!(Scope::Test.propagates(Scope::Compile), Some(Scope::Test));
        assert_eq!(Scope::Test.propagates(Scope::Runtime), Some(Scope::Test));
        assert_eq!(Scope::Test.propagates(Scope::Test), None);

        // Provided and system dependencies terminate the walk.
        assert_eq!(Scope::Provided.propagates(Scope::Compile), None);
        assert_eq!(Scope::System.propagates(Scope::Compile), None);
        assert_eq!(Scope::Site.propagates(Scope::Site), None);
    }

    #[test]
    fn test_parse_round_trip() {
        for scope in [
            Scope::Compile,
            Scope::Runtime,
            Scope::Test,
            Scope::Provided,
            Scope::System,
            Scope::Site,
        ] {
            assert_eq!(scope.to_string().parse::<Scope>().unwrap(), scope);
        }
        assert!("banana".parse::<Scope>().is_err());
    }
}
