//! # Custom Extractors
//!
//! [`ArtifactPath`] turns the three matched path segments into a validated
//! [`ArtifactId`]. Any failure, whether a bad percent-encoding or a segment
//! the identity rejects, is a malformed path and answers 404.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use vcache_core::ArtifactId;

use crate::error::AppError;

/// Identity parsed from `/{name}/{version}/{hash}`.
#[derive(Debug, Clone)]
pub struct ArtifactPath(pub ArtifactId);

impl<S> FromRequestParts<S> for ArtifactPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((name, version, hash)) =
            Path::<(String, String, String)>::from_request_parts(parts, state)
                .await
                .map_err(|e| AppError::NotFound(format!("invalid path: {e}")))?;
        ArtifactId::new(name, version, hash)
            .map(Self)
            .map_err(|e| AppError::NotFound(format!("invalid path: {e}")))
    }
}
