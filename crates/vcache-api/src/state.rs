//! # Application State
//!
//! Shared state for the Axum application, passed to handlers via the
//! `State` extractor. Holds the store and the two capability flags; the
//! handler itself keeps no other state and takes no locks.

use std::fmt;
use std::sync::Arc;

use vcache_core::ArtifactStore;

/// Which artifact operations this deployment serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// `GET` of artifacts is allowed.
    pub readable: bool,
    /// `PUT` of artifacts is allowed.
    pub writable: bool,
}

impl Access {
    /// Reads and writes both enabled.
    pub const READ_WRITE: Self = Self {
        readable: true,
        writable: true,
    };

    /// Uploads disabled.
    pub const READ_ONLY: Self = Self {
        readable: true,
        writable: false,
    };

    /// Downloads disabled.
    pub const WRITE_ONLY: Self = Self {
        readable: false,
        writable: true,
    };
}

impl Default for Access {
    fn default() -> Self {
        Self::READ_WRITE
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ArtifactStore>,
    pub access: Access,
}

impl AppState {
    /// State serving reads and writes from `store`.
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            access: Access::default(),
        }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("store", &"[dyn ArtifactStore]")
            .field("access", &self.access)
            .finish()
    }
}
