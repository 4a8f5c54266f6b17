//! HTTP server plumbing.

pub mod shutdown;
