use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    #[default]
    Accepted,
}

/// "Has transacted with", created the first time two users share a transaction.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Friendship {
    pub id: String,
    pub user1: String,
    pub user2: String,
    pub status: FriendshipStatus,
    pub has_transactions: bool,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub last_interaction: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// Storage key of the unordered pair.
    pub fn pair_key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn other(&self, user_id: &str) -> &str {
        if self.user1 == user_id { &self.user2 } else { &self.user1 }
    }

    pub fn includes(&self, user_id: &str) -> bool {
        self.user1 == user_id || self.user2 == user_id
    }
}
