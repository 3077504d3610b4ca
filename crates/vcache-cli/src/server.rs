//! # Server Lifecycle
//!
//! Opens the configured store, serves the router until the shutdown future
//! resolves, then drains the store. Connections in flight when shutdown
//! begins are allowed to finish before the store is closed.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use vcache_api::AppState;
use vcache_core::{open_store, ArtifactStore, StoreConfig, StoreError};

use crate::config::AppConfig;

/// Number of `close` attempts before giving up.
pub const CLOSE_ATTEMPTS: u32 = 5;
/// Pause between `close` attempts.
pub const CLOSE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Run the server described by `config` until `shutdown` resolves.
pub async fn run<F>(config: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store_config = match config.store.clone() {
        Some(store) => store,
        None => {
            let store = StoreConfig::default();
            tracing::info!(store = %store, "use default store");
            store
        }
    };

    let store = open_store(&store_config)
        .await
        .context("failed to initialize a store")?;

    let access = config.access();
    if !access.writable {
        tracing::info!("upload disabled");
    }
    if !access.readable {
        tracing::info!("download disabled");
    }

    let listener = match TcpListener::bind((config.host.as_str(), config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            let _ = close_store(store.as_ref(), CLOSE_ATTEMPTS, CLOSE_RETRY_DELAY).await;
            return Err(err)
                .with_context(|| format!("failed to listen on {}:{}", config.host, config.port));
        }
    };

    let state = AppState::new(store.clone()).with_access(access);
    let served = serve(listener, state, shutdown).await;

    // Drain even if serving failed; the store may hold staged uploads.
    let _ = close_store(store.as_ref(), CLOSE_ATTEMPTS, CLOSE_RETRY_DELAY).await;

    served.context("unexpected server close")?;
    tracing::info!("server closed gracefully");
    Ok(())
}

/// Serve the router on `listener` until `shutdown` resolves and every
/// open connection has finished.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "start server");

    let app = vcache_api::app(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// Close `store`, retrying while uploads are still finishing.
pub async fn close_store(
    store: &dyn ArtifactStore,
    attempts: u32,
    delay: Duration,
) -> Result<(), StoreError> {
    let mut attempt = 1;
    loop {
        match store.close().await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < attempts => {
                tracing::warn!(attempt, error = %err, "failed to close the store, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(attempts, error = %err, "failed to close the store");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tokio::io::AsyncRead;
    use vcache_core::{ArtifactId, ArtifactReader};

    /// Store whose `close` fails a fixed number of times.
    struct Stubborn {
        failures: u32,
        calls: AtomicU32,
    }

    impl Stubborn {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ArtifactStore for Stubborn {
        async fn get(&self, _id: &ArtifactId) -> Result<ArtifactReader, StoreError> {
            Err(StoreError::NotFound)
        }

        async fn head(&self, _id: &ArtifactId) -> Result<u64, StoreError> {
            Err(StoreError::NotFound)
        }

        async fn put(
            &self,
            _id: &ArtifactId,
            _body: &mut (dyn AsyncRead + Send + Unpin),
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(StoreError::io(
                    "remove work directory",
                    std::io::Error::other("busy"),
                ))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn close_succeeds_first_time() {
        let store = Stubborn::new(0);
        close_store(&store, 3, Duration::ZERO).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_retries_until_success() {
        let store = Stubborn::new(2);
        close_store(&store, 3, Duration::ZERO).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn close_gives_up_after_attempts() {
        let store = Stubborn::new(10);
        let err = close_store(&store, 3, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }
}
