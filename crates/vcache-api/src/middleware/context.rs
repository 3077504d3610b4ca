//! # Request Context
//!
//! Outermost middleware. Assigns every request a short correlation ticket
//! and resolves the best-effort client address, then stores both in a
//! [`RequestContext`] request extension. The tracing layer reads it to build
//! the request span; handlers receive it as an ordinary `Extension` and pass
//! it down explicitly.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Header set by a trusted reverse proxy with the original client address.
pub const REAL_IP: &str = "x-real-ip";
/// Standard proxy chain header; used when `X-Real-Ip` is absent.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

const TICKET_LEN: usize = 8;

/// Per-request values shared by logging and handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Short correlation token carried by every log record of the request.
    pub ticket: String,
    /// Client address: `X-Real-Ip`, else `X-Forwarded-For`, else the peer.
    pub remote_addr: String,
}

impl RequestContext {
    /// Build a context for a request with the given headers and peer.
    pub fn new(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            ticket: new_ticket(),
            remote_addr: remote_addr(headers, peer),
        }
    }
}

fn new_ticket() -> String {
    let mut ticket = Uuid::new_v4().simple().to_string();
    ticket.truncate(TICKET_LEN);
    ticket
}

fn remote_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    [REAL_IP, FORWARDED_FOR]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.to_string()))
        .unwrap_or_else(|| "-".to_string())
}

/// Middleware inserting a [`RequestContext`] into the request extensions.
pub async fn assign_context(mut request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ctx = RequestContext::new(request.headers(), peer);
    request.extensions_mut().insert(ctx);
    next.run(request).await
}
