//! Data models for the Design Twitter API.
//!
//! This module contains the request and response payloads exchanged with
//! the backend:
//!
//! - `SignupRequest`, `LoginRequest`, `AuthResponse`: credential exchange
//! - `Profile`, `SearchHit`: user lookups
//! - `FeedItem`: timeline posts
//! - `TweetRequest`, `FollowRequest`, `MessageResponse`: write actions

pub mod auth;
pub mod feed;
pub mod user;

pub use auth::{AuthResponse, LoginRequest, MessageResponse, SignupRequest};
pub use feed::{FeedItem, FollowRequest, TweetRequest};
pub use user::{Profile, SearchHit};

use serde::{Deserialize, Deserializer};

/// Accept an identifier sent either as a JSON string or a number.
/// Mongo-backed deployments send ObjectId strings, others send integers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
    })
}
