//! # Error Types
//!
//! Errors raised by the storage core. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Store outcomes are checked by variant. `NotFound` and `AlreadyExists`
//!   are the two conditions callers branch on; everything else is an opaque
//!   I/O failure that keeps its `source` for the cause chain.
//! - Configuration and backend selection errors name the offending kind or
//!   option so startup failures are self-explanatory.

use std::path::PathBuf;

use thiserror::Error;

/// Outcome of a failed [`ArtifactStore`](crate::ArtifactStore) operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No artifact exists at the requested identity.
    #[error("artifact not found")]
    NotFound,

    /// An artifact already occupies the requested identity.
    #[error("artifact already exists")]
    AlreadyExists,

    /// Any other filesystem or I/O failure.
    #[error("{context}: {source}")]
    Io {
        /// What the store was doing when the failure happened.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Wrap an I/O error with a description of the failed step.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Map "no such file" to [`StoreError::NotFound`], anything else to
    /// an opaque I/O failure.
    pub(crate) fn from_lookup(context: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::io(context, source)
        }
    }

    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Returns `true` for [`StoreError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists)
    }
}

/// A path segment rejected while building an [`ArtifactId`](crate::ArtifactId).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The segment is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Which identity field was rejected.
        field: &'static str,
    },

    /// The segment contains a separator or NUL byte.
    #[error("{field} contains forbidden character {ch:?}")]
    ForbiddenChar {
        /// Which identity field was rejected.
        field: &'static str,
        /// The offending character.
        ch: char,
    },

    /// The segment starts with a dot (`.`, `..`, hidden entries).
    #[error("{field} must not start with '.'")]
    LeadingDot {
        /// Which identity field was rejected.
        field: &'static str,
    },
}

/// Violation of the `kind[:[path][,opt[=val]]...]` store grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreConfigError {
    /// Nothing before the first `:`.
    #[error("kind must be specified")]
    MissingKind,

    /// The kind contains `,` or `=`.
    #[error("invalid kind value: {0:?}")]
    InvalidKind(String),
}

/// Failure to construct a store from a [`StoreConfig`](crate::StoreConfig).
#[derive(Error, Debug)]
pub enum BackendError {
    /// No backend is registered under this kind.
    #[error("kind not supported: {0}")]
    UnsupportedKind(String),

    /// The backend does not understand this option.
    #[error("option not supported by {kind} store: {option}")]
    UnsupportedOption {
        /// Store kind the option was given to.
        kind: String,
        /// The unrecognized option key.
        option: String,
    },

    /// The default location needs a home directory and none is known.
    #[error("get home directory: no home directory for the current user")]
    NoHomeDir,

    /// The store was selected but failed to open (including the self-test).
    #[error("open {kind} store at {}: {source}", path.display())]
    Open {
        /// Store kind being opened.
        kind: String,
        /// Root directory of the store.
        path: PathBuf,
        /// Why opening failed.
        #[source]
        source: StoreError,
    },
}
