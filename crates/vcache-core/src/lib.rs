//! # vcache-core — Storage Core for the Artifact Cache
//!
//! Write-once, read-many storage of binary artifacts addressed by an
//! [`ArtifactId`] (`name`, `version`, `hash`). Nothing in this crate knows
//! about HTTP; the protocol layer lives in `vcache-api`.
//!
//! ## Key Design Principles
//!
//! 1. **Validated identity.** `ArtifactId` can only be built from segments
//!    that are safe to use as relative path components.
//!
//! 2. **Capability trait over backends.** [`ArtifactStore`] is the only
//!    surface the protocol layer sees. [`FsStore`] is the filesystem variant.
//!
//! 3. **Atomic visibility.** Artifacts are staged in a scratch directory and
//!    renamed into the root in a single step. Nothing partial is ever
//!    observable under the root.
//!
//! 4. **Closed error taxonomy.** [`StoreError`] distinguishes `NotFound`,
//!    `AlreadyExists`, and an opaque I/O failure with its cause chain.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vcache-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod backend;
pub mod error;
pub mod fs_store;
pub mod identity;
pub mod resolver;
pub mod store;

pub use backend::{open_store, StoreConfig};
pub use error::{BackendError, IdentityError, StoreConfigError, StoreError};
pub use fs_store::{FsStore, FsStoreConfig};
pub use identity::ArtifactId;
pub use resolver::PathResolver;
pub use store::{ArtifactReader, ArtifactStore};
