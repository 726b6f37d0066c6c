//! Mapfile viewer service library.
//!
//! Exposes the service modules so the binary and the integration tests share
//! them.

pub mod config;
pub mod engine;
pub mod handlers;
pub mod metrics;
pub mod proxy;
pub mod routing;
pub mod state;
pub mod template;
pub mod viewer_config;
