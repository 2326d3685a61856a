//! Upload Gateway HTTP API
//!
//! Accepts multipart uploads, stores them in a chunk store under a random
//! filename, and streams them back by name.

pub mod cors;
pub mod download;
pub mod error;
pub mod filename;
pub mod server;
pub mod upload;

pub use cors::CorsPolicy;
pub use error::GatewayError;
pub use server::{build_router, start_server, GatewayConfig, GatewayState};
