//! Core Module - Infrastructure shared by the whole client
//!
//! - Session and token claims
//! - Configuration
//! - Error taxonomy

pub mod auth;
pub mod config;
pub mod error;

pub use auth::{Claims, Session, read_claims};
pub use config::Config;
pub use error::{ChatError, ChatResult};
