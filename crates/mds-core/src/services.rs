//! The services file: the source of truth for the service registry.
//!
//! ```json
//! {
//!   "services": [
//!     { "id": "svc-1", "name": "Service One", "public_key": "<encoded Ed25519 public key>" }
//!   ]
//! }
//! ```
//!
//! Loading never fails because of a single bad entry. Entries whose key does
//! not parse are logged and still registered, so requests from that client
//! are rejected as a server misconfiguration instead of as an unknown caller.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use mds_auth::registry::{RegistrySnapshot, ServiceIdentity, SharedServiceRegistry};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};

/// Written when the services file does not exist yet.
pub const DEFAULT_SERVICES_FILE: &str = r#"{
  "services": [
    {
      "id": "example-client",
      "name": "Example Service",
      "public_key": "base64_ed25519_public_key_here"
    }
  ]
}
"#;

/// Parsed contents of the services file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesFile {
    /// Registered callers.
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

/// One registered caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Client id presented in `X-Client-Id`.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Encoded Ed25519 public key.
    pub public_key: String,
}

impl ServicesFile {
    /// Parse a services file from JSON text.
    pub fn from_json(path: &Path, text: &str) -> ConfigResult<Self> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse the file at `path`.
    pub fn read(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
        Self::from_json(path, &text)
    }

    /// Build a registry snapshot, logging suspicious entries.
    #[must_use]
    pub fn into_snapshot(self) -> RegistrySnapshot {
        let mut seen = HashSet::new();
        let mut identities = Vec::with_capacity(self.services.len());

        for entry in self.services {
            if entry.id.is_empty() {
                warn!("Skipping service entry without an id");
                continue;
            }
            if !seen.insert(entry.id.clone()) {
                warn!(client_id = %entry.id, "Duplicate service id, later entry wins");
            }

            let identity = ServiceIdentity::new(entry.id, entry.public_key);
            if let Err(e) = identity.parse_public_key() {
                warn!(
                    client_id = %identity.client_id,
                    error = %e,
                    "Registered public key cannot be parsed"
                );
            }

            identities.push(match entry.name {
                Some(name) => identity.with_name(name),
                None => identity,
            });
        }

        RegistrySnapshot::new(identities)
    }
}

/// Write [`DEFAULT_SERVICES_FILE`] to `path` if nothing exists there.
///
/// Returns whether a file was created.
pub fn ensure_services_file(path: &Path) -> ConfigResult<bool> {
    if path.exists() {
        return Ok(false);
    }

    info!(path = %path.display(), "Services file not found, creating default");
    fs::write(path, DEFAULT_SERVICES_FILE).map_err(|source| io_error(path, source))?;
    Ok(true)
}

/// Load the registry snapshot described by the services file at `path`.
pub fn load_registry(path: &Path) -> ConfigResult<RegistrySnapshot> {
    Ok(ServicesFile::read(path)?.into_snapshot())
}

/// Reload `registry` from `path`.
///
/// On failure the registry keeps serving its current snapshot. Returns the
/// number of registered services after a successful reload.
pub fn reload_registry(path: &Path, registry: &SharedServiceRegistry) -> ConfigResult<usize> {
    let snapshot = load_registry(path)?;
    let count = snapshot.len();
    registry.replace(snapshot);
    info!(path = %path.display(), services = count, "Service registry reloaded");
    Ok(count)
}

/// Detects modifications of the services file by polling its mtime.
#[derive(Debug, Clone)]
pub struct ServicesFileWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl ServicesFileWatcher {
    /// Start watching `path` from its current state.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_modified = modified_at(&path);
        Self {
            path,
            last_modified,
        }
    }

    /// The watched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file changed since the previous call (or since creation).
    pub fn poll_changed(&mut self) -> bool {
        let current = modified_at(&self.path);
        if current == self.last_modified {
            return false;
        }
        self.last_modified = current;
        current.is_some()
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}
