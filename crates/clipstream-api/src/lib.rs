//! Clipstream REST API
//!
//! This crate provides the Axum-based HTTP API for Clipstream: the
//! authentication endpoints and the owner-gated resource endpoints.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
