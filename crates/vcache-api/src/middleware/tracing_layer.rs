//! # Request/Response Tracing
//!
//! Configures `tower_http::trace::TraceLayer` so that every request yields
//! one arrival record and one completion record, both inside a `request`
//! span carrying the correlation ticket, method, path and client address.
//!
//! Completion severity follows the status: INFO below 400, WARN for client
//! errors, ERROR for server errors.

use std::time::Duration;

use axum::http::{Request, Response};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{
    DefaultOnBodyChunk, DefaultOnEos, MakeSpan, OnRequest, OnResponse, TraceLayer,
};
use tracing::Span;

use super::context::RequestContext;

/// Span factory and arrival logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let (ticket, remote_addr) = match request.extensions().get::<RequestContext>() {
            Some(ctx) => (ctx.ticket.as_str(), ctx.remote_addr.as_str()),
            None => ("-", "-"),
        };
        tracing::info_span!(
            "request",
            ticket = %ticket,
            method = %request.method(),
            path = %request.uri().path(),
            remote_addr = %remote_addr,
        )
    }
}

impl<B> OnRequest<B> for RequestSpan {
    fn on_request(&mut self, request: &Request<B>, _span: &Span) {
        tracing::info!("REQ {}", request.method());
    }
}

/// Completion logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseLog;

impl<B> OnResponse<B> for ResponseLog {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let status = response.status();
        let latency_ms = latency.as_secs_f64() * 1000.0;
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), latency_ms, "RES");
        } else if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), latency_ms, "RES");
        } else {
            tracing::info!(status = status.as_u16(), latency_ms, "RES");
        }
    }
}

/// The configured layer type.
pub type RequestTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    RequestSpan,
    RequestSpan,
    ResponseLog,
    DefaultOnBodyChunk,
    DefaultOnEos,
    (),
>;

/// Build the request tracing layer.
///
/// Failure logging is disabled: the completion record already reports
/// server errors at ERROR.
pub fn layer() -> RequestTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_request(RequestSpan)
        .on_response(ResponseLog)
        .on_failure(())
}
