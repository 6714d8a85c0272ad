//! HTTP server: state, middleware, REST exposure and the OpenAPI document
//!
//! [`ServerBuilder`] wires configuration, the article store and the auth
//! provider into an axum `Router`.

pub mod builder;
pub mod exposure;
pub mod middleware;
pub mod openapi;
pub mod state;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use state::AppState;
