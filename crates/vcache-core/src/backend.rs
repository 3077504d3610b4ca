//! # Store Selection
//!
//! Parses the `kind[:[path][,opt[=val]]...]` selector and turns an already
//! parsed [`StoreConfig`] into a running [`ArtifactStore`].
//!
//! ## Kinds
//!
//! | Kind       | Layout                     | Default path                    |
//! |------------|----------------------------|---------------------------------|
//! | `files`    | `name/version/hash`        | `vcpkg-cache`                   |
//! | `archives` | `hash[0..2]/hash.zip`      | `$HOME/.cache/vcpkg/archives`   |
//!
//! Both kinds accept `work=<dir>` to move the work directory out of the root.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, StoreConfigError};
use crate::fs_store::{FsStore, FsStoreConfig};
use crate::resolver::{PathResolver, ARCHIVE_SUFFIX};
use crate::store::ArtifactStore;

/// Directory-per-identity store.
pub const KIND_FILES: &str = "files";
/// Flat-hash archive store compatible with the vcpkg `files` provider.
pub const KIND_ARCHIVES: &str = "archives";

/// Root used by `files` when no path is given.
pub const DEFAULT_FILES_PATH: &str = "vcpkg-cache";

const OPT_WORK: &str = "work";

/// A parsed store selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub kind: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub opts: BTreeMap<String, String>,
}

impl StoreConfig {
    /// Selector for a `kind` at `path` with no options.
    pub fn new(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
            opts: BTreeMap::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(KIND_FILES, DEFAULT_FILES_PATH)
    }
}

impl FromStr for StoreConfig {
    type Err = StoreConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = match s.split_once(':') {
            Some((kind, rest)) => (kind, Some(rest)),
            None => (s, None),
        };
        if kind.is_empty() {
            return Err(StoreConfigError::MissingKind);
        }
        if kind.contains([',', '=']) {
            return Err(StoreConfigError::InvalidKind(kind.to_string()));
        }

        let mut config = StoreConfig::new(kind, "");
        let Some(rest) = rest else {
            return Ok(config);
        };

        let mut parts = rest.split(',');
        config.path = parts.next().unwrap_or_default().to_string();
        for opt in parts {
            let (key, value) = opt.split_once('=').unwrap_or((opt, ""));
            if key.is_empty() {
                continue;
            }
            config.opts.insert(key.to_string(), value.to_string());
        }
        Ok(config)
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.path)?;
        for (key, value) in &self.opts {
            if value.is_empty() {
                write!(f, ",{key}")?;
            } else {
                write!(f, ",{key}={value}")?;
            }
        }
        Ok(())
    }
}

/// Construct the store described by `config`, running its self-test.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn ArtifactStore>, BackendError> {
    let (root, resolver) = match config.kind.as_str() {
        KIND_FILES => {
            let root = if config.path.is_empty() {
                PathBuf::from(DEFAULT_FILES_PATH)
            } else {
                PathBuf::from(&config.path)
            };
            (root, PathResolver::nested())
        }
        KIND_ARCHIVES => {
            let root = if config.path.is_empty() {
                default_archives_path()?
            } else {
                PathBuf::from(&config.path)
            };
            (root, PathResolver::sharded(ARCHIVE_SUFFIX))
        }
        other => return Err(BackendError::UnsupportedKind(other.to_string())),
    };

    let mut fs_config = FsStoreConfig::new(&root).with_resolver(resolver);
    for (key, value) in &config.opts {
        match key.as_str() {
            OPT_WORK if !value.is_empty() => fs_config = fs_config.with_work_dir(value),
            _ => {
                return Err(BackendError::UnsupportedOption {
                    kind: config.kind.clone(),
                    option: key.clone(),
                })
            }
        }
    }

    let store = FsStore::open(fs_config)
        .await
        .map_err(|source| BackendError::Open {
            kind: config.kind.clone(),
            path: root.clone(),
            source,
        })?;
    tracing::info!(kind = %config.kind, root = %root.display(), "store opened");
    Ok(Arc::new(store))
}

fn default_archives_path() -> Result<PathBuf, BackendError> {
    let home = dirs::home_dir().ok_or(BackendError::NoHomeDir)?;
    Ok(home.join(".cache").join("vcpkg").join("archives"))
}
