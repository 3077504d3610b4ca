//! # Route Modules
//!
//! - [`artifacts`]: `/{name}/{version}/{hash}` GET/HEAD/PUT.
//! - [`probe`]: `GET /` liveness probe and the 404 fallback.

pub mod artifacts;
pub mod probe;
