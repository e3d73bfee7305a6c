//! REST API client module for the Design Twitter backend.
//!
//! This module provides the `ApiClient` for signing up, logging in and
//! making authorized calls (profile, feed, search, tweet, follow).
//!
//! Authorized calls carry `Authorization: Bearer <token>` taken from the
//! shared `SessionManager`; a 401 on any of them ends the session.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
