//! # Filesystem Store
//!
//! [`ArtifactStore`] over a directory tree.
//!
//! ## Layout
//!
//! ```text
//! {root}/                  durable artifacts, placed by the PathResolver
//! {work}/                  shared work root (default: {root}/.work)
//! {work}/{instance}/       scratch space owned by one FsStore instance
//! ```
//!
//! ## Integrity Invariant
//!
//! Every file visible under the root is complete. Writes are staged in the
//! instance's scratch directory and moved into place by a single no-clobber
//! rename. A staged file that is never renamed (client disconnect, disk
//! error, dropped future) is deleted when its handle is dropped.
//!
//! ## Startup Self-Test
//!
//! [`FsStore::open`] writes a small file into scratch, renames it into the
//! root, and deletes it. Any failure aborts construction, so a store that
//! exists has proven it can write, rename across its two directories, and
//! delete.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tempfile::NamedTempFile;
use tokio::io::AsyncRead;
use tokio::task;
use uuid::Uuid;

use crate::error::StoreError;
use crate::identity::ArtifactId;
use crate::resolver::PathResolver;
use crate::store::{ArtifactReader, ArtifactStore};

/// Work directory name used when none is configured, relative to the root.
pub const DEFAULT_WORK_DIR: &str = ".work";

const SELF_TEST_PAYLOAD: &[u8] = b"vcache self-test";

/// Construction parameters of a [`FsStore`].
#[derive(Debug, Clone)]
pub struct FsStoreConfig {
    /// Durable artifact directory. Created if missing.
    pub root: PathBuf,
    /// Shared work root. `None` means `{root}/.work`.
    pub work_dir: Option<PathBuf>,
    /// Key → relative path policy. Defaults to [`PathResolver::nested`].
    pub resolver: PathResolver,
}

impl FsStoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            work_dir: None,
            resolver: PathResolver::default(),
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

/// A content-addressable store backed by the local filesystem.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    scratch: PathBuf,
    resolver: PathResolver,
}

impl FsStore {
    /// Prepare the directories, allocate this instance's scratch space, and
    /// run the self-test.
    pub async fn open(config: FsStoreConfig) -> Result<Self, StoreError> {
        let FsStoreConfig {
            root,
            work_dir,
            resolver,
        } = config;
        let work = work_dir.unwrap_or_else(|| root.join(DEFAULT_WORK_DIR));

        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io("create store directory", e))?;
        fs::create_dir_all(&work)
            .await
            .map_err(|e| StoreError::io("create work directory", e))?;

        // One scratch directory per instance so stores sharing a work root
        // never see each other's staged files.
        let scratch = work.join(Uuid::new_v4().simple().to_string());
        fs::create_dir(&scratch)
            .await
            .map_err(|e| StoreError::io("create work context at work directory", e))?;

        let store = Self {
            root,
            scratch,
            resolver,
        };
        if let Err(e) = store.self_test().await {
            let _ = fs::remove_dir(&store.scratch).await;
            return Err(e);
        }

        tracing::debug!(
            root = %store.root.display(),
            scratch = %store.scratch.display(),
            resolver = store.resolver.label(),
            "filesystem store ready"
        );
        Ok(store)
    }

    /// Durable artifact directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch directory owned by this instance.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch
    }

    /// Absolute storage path of `id`.
    pub fn resolve(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(self.resolver.resolve(id))
    }

    async fn self_test(&self) -> Result<(), StoreError> {
        let staged = self
            .stage()
            .await
            .map_err(|e| StoreError::io("self-test: create file at work directory", e))?;
        let target = self
            .root
            .join(format!(".self-test-{}", Uuid::new_v4().simple()));

        blocking(move || {
            let mut staged = staged;
            staged
                .write_all(SELF_TEST_PAYLOAD)
                .map_err(|e| StoreError::io("self-test: write to file at work directory", e))?;
            staged
                .as_file()
                .sync_all()
                .map_err(|e| StoreError::io("self-test: close file at work directory", e))?;
            staged.persist_noclobber(&target).map_err(|e| {
                StoreError::io(
                    "self-test: rename file from work directory to store directory",
                    e.error,
                )
            })?;
            std::fs::remove_file(&target)
                .map_err(|e| StoreError::io("self-test: remove file at store directory", e))
        })
        .await
    }

    /// Create an empty staged file in this instance's scratch directory.
    async fn stage(&self) -> io::Result<NamedTempFile> {
        let scratch = self.scratch.clone();
        task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(".stage-")
                .tempfile_in(&scratch)
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// Run blocking filesystem work off the async worker threads.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::io("join blocking task", io::Error::other(e)))?
}

/// Unlink an abandoned staged file off the async worker threads.
async fn discard(staged: NamedTempFile) {
    let path = staged.path().to_path_buf();
    let closed = task::spawn_blocking(move || staged.close()).await;
    if !matches!(closed, Ok(Ok(()))) {
        tracing::warn!(path = %path.display(), "failed to remove staged file");
    }
}

/// Copy `body` into the staged file and flush it to disk.
async fn receive(
    staged: &NamedTempFile,
    body: &mut (dyn AsyncRead + Send + Unpin),
) -> Result<u64, StoreError> {
    let handle = staged
        .as_file()
        .try_clone()
        .map_err(|e| StoreError::io("open temp file", e))?;
    let mut file = fs::File::from_std(handle);
    let received = tokio::io::copy(body, &mut file)
        .await
        .map_err(|e| StoreError::io("receive artifact", e))?;
    file.sync_all()
        .await
        .map_err(|e| StoreError::io("flush received artifact", e))?;
    Ok(received)
}

#[async_trait]
impl ArtifactStore for FsStore {
    async fn get(&self, id: &ArtifactId) -> Result<ArtifactReader, StoreError> {
        let path = self.resolve(id);
        let file = fs::File::open(&path)
            .await
            .map_err(|e| StoreError::from_lookup("open artifact", e))?;
        let meta = file
            .metadata()
            .await
            .map_err(|e| StoreError::io("stat artifact", e))?;
        if !meta.is_file() {
            return Err(StoreError::NotFound);
        }
        Ok(Box::new(file))
    }

    async fn head(&self, id: &ArtifactId) -> Result<u64, StoreError> {
        let meta = fs::metadata(self.resolve(id))
            .await
            .map_err(|e| StoreError::from_lookup("stat artifact", e))?;
        if !meta.is_file() {
            return Err(StoreError::NotFound);
        }
        Ok(meta.len())
    }

    async fn put(
        &self,
        id: &ArtifactId,
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), StoreError> {
        let target = self.resolve(id);
        match fs::symlink_metadata(&target).await {
            Ok(_) => return Err(StoreError::AlreadyExists),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io("check target", e)),
        }

        fs::create_dir_all(&self.scratch)
            .await
            .map_err(|e| StoreError::io("create work directory", e))?;
        let staged = self
            .stage()
            .await
            .map_err(|e| StoreError::io("create temp file", e))?;

        let received = match receive(&staged, body).await {
            Ok(received) => received,
            Err(e) => {
                discard(staged).await;
                return Err(e);
            }
        };

        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                discard(staged).await;
                return Err(StoreError::io("create target directory", e));
            }
        }

        // A failed persist hands the staged file back inside the error; it is
        // dropped, and so unlinked, on the blocking thread.
        blocking(move || {
            staged.persist_noclobber(&target).map(drop).map_err(|e| {
                if e.error.kind() == io::ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists
                } else {
                    StoreError::io("move received file to storage", e.error)
                }
            })
        })
        .await?;

        tracing::debug!(artifact = %id, bytes = received, "artifact stored");
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut entries = match fs::read_dir(&self.scratch).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io("read work directory", e)),
        };
        let pending = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io("read work directory", e))?;
        if pending.is_some() {
            return Err(StoreError::io(
                "remove work directory",
                io::Error::other(format!(
                    "{} is not empty; writes are still in progress",
                    self.scratch.display()
                )),
            ));
        }

        match fs::remove_dir(&self.scratch).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io("remove work directory", e)),
        }
    }
}
