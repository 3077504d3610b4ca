//! # Artifact Routes
//!
//! `/{name}/{version}/{hash}` accepting any verb. The path shape is checked
//! first (by routing and [`ArtifactPath`]), then the verb:
//!
//! | Verb   | Gate       | Store call | Success                    |
//! |--------|------------|------------|----------------------------|
//! | GET    | `readable` | `get`      | 200, body streamed         |
//! | HEAD   | none       | `head`     | 200, `Content-Length: n`   |
//! | PUT    | `writable` | `put`      | 200, empty body            |
//! | other  |            |            | 501                        |

use std::io;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use vcache_core::{ArtifactId, StoreError};

use crate::error::{error_chain, AppError};
use crate::extractors::ArtifactPath;
use crate::middleware::context::RequestContext;
use crate::state::AppState;

/// Dispatch an artifact request by verb.
pub async fn artifact(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    method: Method,
    ArtifactPath(id): ArtifactPath,
    body: Body,
) -> Result<Response, AppError> {
    tracing::debug!(
        ticket = %ctx.ticket,
        name = id.name(),
        version = id.version(),
        hash = id.hash(),
        "dispatch {method}"
    );

    match method {
        Method::GET => handle_get(&state, &ctx, &id).await,
        Method::HEAD => handle_head(&state, &ctx, &id).await,
        Method::PUT => handle_put(&state, &ctx, &id, body).await,
        other => Err(AppError::NotImplemented(format!("method {other}"))),
    }
}

async fn handle_get(
    state: &AppState,
    ctx: &RequestContext,
    id: &ArtifactId,
) -> Result<Response, AppError> {
    if !state.access.readable {
        return Err(AppError::MethodNotAllowed("downloads are disabled".into()));
    }

    let reader = state.store.get(id).await.map_err(|e| store_failure(ctx, e))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}

async fn handle_head(
    state: &AppState,
    ctx: &RequestContext,
    id: &ArtifactId,
) -> Result<Response, AppError> {
    let size = state
        .store
        .head(id)
        .await
        .map_err(|e| store_failure(ctx, e))?;
    Ok((StatusCode::OK, [(header::CONTENT_LENGTH, size.to_string())]).into_response())
}

async fn handle_put(
    state: &AppState,
    ctx: &RequestContext,
    id: &ArtifactId,
    body: Body,
) -> Result<Response, AppError> {
    if !state.access.writable {
        return Err(AppError::MethodNotAllowed("uploads are disabled".into()));
    }

    let stream = body.into_data_stream().map_err(io::Error::other);
    let mut reader = Box::pin(StreamReader::new(stream));
    state
        .store
        .put(id, &mut reader)
        .await
        .map_err(|e| store_failure(ctx, e))?;
    Ok(StatusCode::OK.into_response())
}

/// Convert a store error, logging opaque failures with their cause chain.
fn store_failure(ctx: &RequestContext, err: StoreError) -> AppError {
    if let StoreError::Io { .. } = err {
        tracing::error!(ticket = %ctx.ticket, error = %error_chain(&err), "store failure");
    }
    AppError::from(err)
}
