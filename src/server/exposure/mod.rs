//! API exposure layers
//!
//! REST is the only transport; it consumes the shared [`AppState`](crate::server::state::AppState).

pub mod rest;

pub use rest::RestExposure;
