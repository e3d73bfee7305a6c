//! Core library for chirp, a client for the Design Twitter API.
//!
//! The interesting part is the session lifecycle in [`auth`]: how a token
//! is obtained at login/signup, persisted through a pluggable
//! [`store::KeyValueStore`], attached to every authorized request by the
//! [`api::ApiClient`], and dropped on logout or when the server answers 401.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionManager, SessionState};
pub use config::{Config, StorageKind};
pub use store::{KeyValueStore, StoreError};
