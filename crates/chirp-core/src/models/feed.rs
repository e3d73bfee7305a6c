use serde::{Deserialize, Serialize};

use crate::utils::format_timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct FeedItem {
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    pub username: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl FeedItem {
    /// Single-line rendering: `alice (Mar 04, 2025 14:05): hello`
    pub fn display_line(&self) -> String {
        match self.timestamp.as_deref() {
            Some(ts) => format!("{} ({}): {}", self.username, format_timestamp(ts), self.content),
            None => format!("{}: {}", self.username, self.content),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct TweetRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct FollowRequest {
    pub target_username: String,
}
