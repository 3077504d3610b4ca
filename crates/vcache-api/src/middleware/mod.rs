//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`context`]: correlation ticket and client address per request.
//! - [`tracing_layer`]: request/response tracing with `TraceLayer`.

pub mod context;
pub mod tracing_layer;
