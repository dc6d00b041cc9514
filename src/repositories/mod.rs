//! Repositories module - Access to the Breakroom REST API
//!
//! `traits` declares what the façade needs from the backend; `http` is the
//! `reqwest` implementation used in production.

pub mod http;
pub mod traits;

pub use http::HttpChatApi;
pub use traits::{ChatApi, InviteApi, MediaUpload, MessageApi, RoomApi};
