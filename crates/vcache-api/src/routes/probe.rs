//! # Liveness Probe and Fallback
//!
//! `GET /` always answers 200 without touching the store. Every other verb
//! on `/`, and every path that is not exactly three segments, is 404.

use axum::http::{Method, StatusCode, Uri};

use crate::error::AppError;

/// Liveness probe for `GET /`; any other verb on `/` is a malformed path.
pub async fn root(method: Method) -> Result<StatusCode, AppError> {
    if method == Method::GET {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::NotFound("invalid path: /".into()))
    }
}

/// Any path without exactly three segments.
pub async fn fallback(uri: Uri) -> AppError {
    AppError::NotFound(format!("invalid path: {}", uri.path()))
}
