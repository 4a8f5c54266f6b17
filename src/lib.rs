//! capmap: reports which capacity provider placed each ECS task.
//!
//! The library surface exists so integration tests can assemble the router
//! against a stub control plane; the binary in `main.rs` wires the same
//! pieces to the real AWS SDK.

pub mod config;
pub mod ecs;
pub mod error;
pub mod http;
pub mod metadata;
pub mod middleware;
pub mod routes;
pub mod state;
