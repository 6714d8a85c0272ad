//! Core module: authentication and error types shared by every layer

pub mod auth;
pub mod error;

pub use auth::{AuthContext, AuthPolicy, AuthProvider, NoAuthProvider};
pub use error::{ApiError, ErrorBody};
