use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    // Everything else the backend chooses to send
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    pub fn follower_count(&self) -> Option<usize> {
        self.list_len("followers")
    }

    pub fn following_count(&self) -> Option<usize> {
        self.list_len("following")
    }

    fn list_len(&self, field: &str) -> Option<usize> {
        self.extra.get(field).and_then(|v| v.as_array()).map(|a| a.len())
    }
}

/// One search result. Deployments answer either with bare usernames or
/// with `{id, username}` objects; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(untagged)]
pub enum SearchHit {
    Name(String),
    User {
        #[serde(deserialize_with = "super::string_or_number")]
        id: String,
        username: String,
    },
}

impl SearchHit {
    pub fn username(&self) -> &str {
        match self {
            SearchHit::Name(name) => name,
            SearchHit::User { username, .. } => username,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            SearchHit::Name(_) => None,
            SearchHit::User { id, .. } => Some(id),
        }
    }
}
