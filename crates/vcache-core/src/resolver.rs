//! # Key Resolution
//!
//! Maps an [`ArtifactId`] to a path relative to the store root. A resolver
//! is a pure function of the identity: no I/O, no hidden state.
//!
//! Two policies ship with the crate:
//!
//! | Policy    | Layout                         | Used by        |
//! |-----------|--------------------------------|----------------|
//! | nested    | `name/version/hash`            | `files` store  |
//! | sharded   | `hash[0..2]/hash{suffix}`      | `archives` store |
//!
//! Further policies can be supplied with [`PathResolver::custom`] without
//! touching the read/write logic of the store.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::identity::ArtifactId;

/// File suffix of the flat-hash archive layout.
pub const ARCHIVE_SUFFIX: &str = ".zip";

type ResolveFn = dyn Fn(&ArtifactId) -> PathBuf + Send + Sync;

/// Key → relative path policy of a filesystem store.
#[derive(Clone)]
pub struct PathResolver {
    label: &'static str,
    resolve: Arc<ResolveFn>,
}

impl PathResolver {
    /// `name/version/hash`, matching the identity's canonical form.
    pub fn nested() -> Self {
        Self {
            label: "nested",
            resolve: Arc::new(|id: &ArtifactId| {
                [id.name(), id.version(), id.hash()]
                    .iter()
                    .collect::<PathBuf>()
            }),
        }
    }

    /// First two characters of the hash as a directory, then the hash plus
    /// `suffix` as the filename.
    pub fn sharded(suffix: &'static str) -> Self {
        Self {
            label: "sharded",
            resolve: Arc::new(move |id: &ArtifactId| {
                let prefix: String = id.hash().chars().take(2).collect();
                PathBuf::from(prefix).join(format!("{}{suffix}", id.hash()))
            }),
        }
    }

    /// Wrap an arbitrary resolution function.
    pub fn custom(
        label: &'static str,
        resolve: impl Fn(&ArtifactId) -> PathBuf + Send + Sync + 'static,
    ) -> Self {
        Self {
            label,
            resolve: Arc::new(resolve),
        }
    }

    /// Relative path of `id` under the store root.
    pub fn resolve(&self, id: &ArtifactId) -> PathBuf {
        (self.resolve)(id)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::nested()
    }
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathResolver")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
