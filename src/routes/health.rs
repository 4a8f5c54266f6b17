//! Liveness probe endpoint.
//!
//! Returns 200 OK whenever the process can respond to HTTP. It must never
//! touch the control plane or the metadata endpoint, so orchestrators keep
//! the task alive through upstream outages.

/// Health check handler.
pub async fn health() -> &'static str {
    "ok"
}
