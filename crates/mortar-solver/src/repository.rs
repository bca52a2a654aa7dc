//! Remote repository access.
//!
//! Repositories are tried in declared priority order; the first endpoint to
//! respond successfully wins, and failures (network errors, 404s) fall
//! through to the next one. A failure is only surfaced to the caller once
//! every endpoint has been exhausted. Offline mode short-circuits every
//! operation without attempting network I/O.

use mortar_core::{ArtifactKey, Coordinate, VersionMarker};
use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("mortar is offline; network functions are disabled")]
    Offline,

    #[error("no dependency repositories have been defined")]
    NoRepositories,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(
        "{coordinate} was not available from any repository\n{}\n\n  Suggestions:\n    - Check the coordinate spelling\n    - Verify the repository list in your project settings",
        .attempts.iter().map(|a| format!("    - {}", a)).collect::<Vec<_>>().join("\n")
    )]
    Unavailable {
        coordinate: String,
        attempts: Vec<String>,
    },

    #[error("hash mismatch for {coordinate}: expected {expected}, got {actual}")]
    HashMismatch {
        coordinate: String,
        expected: String,
        actual: String,
    },

    #[error("invalid repository metadata for {key}: {reason}")]
    Metadata { key: String, reason: String },
}

/// One remote repository endpoint.
#[derive(Debug, Clone)]
pub struct Repository {
    pub name: String,
    pub url: String,
}

impl Repository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            name: name.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of an artifact in this repository.
    pub fn artifact_url(&self, coordinate: &Coordinate, extension: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.url,
            coordinate.group_as_path(),
            coordinate.artifact_id,
            coordinate.version,
            coordinate.file_name(extension)
        )
    }

    /// URL of the per-artifact metadata document.
    pub fn metadata_url(&self, key: &ArtifactKey) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.url,
            key.group_id.replace('.', "/"),
            key.artifact_id
        )
    }
}

/// Remote facts parsed from a per-artifact metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
}

impl RemoteMetadata {
    /// Parse a Maven-format `maven-metadata.xml` document.
    pub fn parse(key: &ArtifactKey, bytes: &[u8]) -> Result<Self, RepoError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut metadata = RemoteMetadata::default();
        let mut path: Vec<String> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    path.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
                Ok(Event::End(_)) => {
                    path.pop();
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| RepoError::Metadata {
                            key: key.to_string(),
                            reason: e.to_string(),
                        })?
                        .into_owned();

                    match path.last().map(String::as_str) {
                        Some("latest") => metadata.latest = Some(text),
                        Some("release") => metadata.release = Some(text),
                        Some("version")
                            if path.iter().rev().nth(1).map(String::as_str)
                                == Some("versions") =>
                        {
                            metadata.versions.push(text);
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(RepoError::Metadata {
                        key: key.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
            buf.clear();
        }

        Ok(metadata)
    }

    /// Resolve a version marker to a concrete version.
    ///
    /// Prefers the explicit `release`/`latest` elements, falling back to
    /// picking from the version list.
    pub fn concrete(&self, marker: VersionMarker) -> Option<String> {
        let explicit = match marker {
            VersionMarker::Release => self.release.clone(),
            VersionMarker::Latest => self.latest.clone(),
        };
        explicit.or_else(|| marker.select(self.versions.iter().map(String::as_str)))
    }
}

/// Options for the repository client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// HTTP timeout in seconds.
    pub timeout: u64,
    /// Attempts per endpoint before falling through to the next one.
    pub retries: u32,
    /// Whether to verify `.sha256` sidecar checksums when published.
    pub verify_checksums: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: 60,
            retries: 2,
            verify_checksums: true,
        }
    }
}

/// Client over an ordered list of repository endpoints.
pub struct RepositoryClient {
    repositories: Vec<Repository>,
    client: reqwest::Client,
    online: bool,
    options: ClientOptions,
}

impl RepositoryClient {
    pub fn new(repositories: Vec<Repository>, online: bool) -> Result<Self, RepoError> {
        Self::with_options(repositories, online, ClientOptions::default())
    }

    /// Build a client honoring the process-wide online switch.
    pub fn from_env(repositories: Vec<Repository>) -> Result<Self, RepoError> {
        Self::new(repositories, mortar_core::env::online())
    }

    pub fn with_options(
        repositories: Vec<Repository>,
        online: bool,
        options: ClientOptions,
    ) -> Result<Self, RepoError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout))
            .build()?;
        Ok(Self {
            repositories,
            client,
            online,
            options,
        })
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// Fetch an artifact's bytes, trying each repository in priority order.
    pub async fn fetch_artifact(
        &self,
        coordinate: &Coordinate,
        extension: &str,
    ) -> Result<Vec<u8>, RepoError> {
        if !self.online {
            return Err(RepoError::Offline);
        }
        if self.repositories.is_empty() {
            return Err(RepoError::NoRepositories);
        }

        let mut attempts = Vec::new();
        for repository in &self.repositories {
            let url = repository.artifact_url(coordinate, extension);
            match self.get_bytes(&url).await {
                Ok(Some(bytes)) => {
                    if self.options.verify_checksums {
                        self.verify_checksum(coordinate, &url, &bytes).await?;
                    }
                    info!("Downloaded {} from {}", coordinate, repository.name);
                    return Ok(bytes);
                }
                Ok(None) => {
                    debug!("{} not found at {}", coordinate, url);
                    attempts.push(format!("{}: not found", repository.name));
                }
                Err(reason) => {
                    warn!("{} failed for {}: {}", repository.name, coordinate, reason);
                    attempts.push(format!("{}: {}", repository.name, reason));
                }
            }
        }

        Err(RepoError::Unavailable {
            coordinate: format!("{}@{}", coordinate, extension),
            attempts,
        })
    }

    /// Fetch the per-artifact metadata document, trying each repository in
    /// priority order.
    pub async fn fetch_metadata(&self, key: &ArtifactKey) -> Result<Vec<u8>, RepoError> {
        if !self.online {
            return Err(RepoError::Offline);
        }
        if self.repositories.is_empty() {
            return Err(RepoError::NoRepositories);
        }

        let mut attempts = Vec::new();
        for repository in &self.repositories {
            let url = repository.metadata_url(key);
            match self.get_bytes(&url).await {
                Ok(Some(bytes)) => {
                    debug!("Fetched metadata for {} from {}", key, repository.name);
                    return Ok(bytes);
                }
                Ok(None) => attempts.push(format!("{}: not found", repository.name)),
                Err(reason) => attempts.push(format!("{}: {}", repository.name, reason)),
            }
        }

        Err(RepoError::Unavailable {
            coordinate: key.to_string(),
            attempts,
        })
    }

    /// GET a URL with per-endpoint retry. `Ok(None)` is a 404-equivalent;
    /// `Err` carries the last failure after retries are exhausted.
    async fn get_bytes(&self, url: &str) -> Result<Option<Vec<u8>>, String> {
        let attempts = self.options.retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                debug!("Retrying {} (attempt {})", url, attempt + 1);
            }

            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.bytes().await {
                        Ok(bytes) => return Ok(Some(bytes.to_vec())),
                        Err(e) => last_error = e.to_string(),
                    }
                }
                Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => {
                    return Ok(None);
                }
                Ok(response) => last_error = format!("HTTP {}", response.status()),
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(last_error)
    }

    /// Verify a downloaded artifact against its `.sha256` sidecar, when the
    /// repository publishes one. A missing sidecar is not an error.
    async fn verify_checksum(
        &self,
        coordinate: &Coordinate,
        url: &str,
        bytes: &[u8],
    ) -> Result<(), RepoError> {
        let sidecar_url = format!("{}.sha256", url);
        let expected = match self.get_bytes(&sidecar_url).await {
            Ok(Some(body)) => {
                let text = String::from_utf8_lossy(&body);
                // Sidecar format is "hash  filename"; take just the hash.
                text.split_whitespace().next().unwrap_or_default().to_lowercase()
            }
            Ok(None) | Err(_) => {
                debug!("No checksum sidecar for {}", url);
                return Ok(());
            }
        };

        if expected.is_empty() {
            return Ok(());
        }

        let actual = format!("{:x}", Sha256::digest(bytes));
        if actual != expected {
            return Err(RepoError::HashMismatch {
                coordinate: coordinate.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
