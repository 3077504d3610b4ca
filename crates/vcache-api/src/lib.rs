//! # vcache-api — HTTP Protocol Layer
//!
//! Maps the artifact store's semantics onto an HTTP-shaped surface that
//! binary-cache clients already speak.
//!
//! ## API Surface
//!
//! | Request                          | Outcome                                  |
//! |----------------------------------|------------------------------------------|
//! | `GET /`                          | 200 (liveness, store untouched)          |
//! | `GET /{name}/{version}/{hash}`   | 200 + body, 404 absent, 405 reads off    |
//! | `HEAD /{name}/{version}/{hash}`  | 200 + `Content-Length`, 404 absent       |
//! | `PUT /{name}/{version}/{hash}`   | 200 stored, 409 present, 405 writes off  |
//! | other verb on a three-segment path | 501                                   |
//! | any other path shape             | 404                                      |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! assign_context → TraceLayer → Handler
//! ```
//!
//! ## Crate Policy
//!
//! - No filesystem access: every artifact operation goes through
//!   [`vcache_core::ArtifactStore`].
//! - All errors map to responses via [`AppError`].

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use middleware::context::RequestContext;
pub use state::{Access, AppState};

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::any;
use axum::Router;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", any(routes::probe::root))
        .route("/{name}/{version}/{hash}", any(routes::artifacts::artifact))
        .fallback(routes::probe::fallback)
        // Artifacts are streamed; no in-memory body cap applies.
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::tracing_layer::layer())
        .layer(from_fn(middleware::context::assign_context))
        .with_state(state)
}
