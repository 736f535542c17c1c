use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const SUPPORTED_CURRENCIES: [&str; 5] = ["PKR", "USD", "EUR", "GBP", "INR"];
pub const DEFAULT_CURRENCY: &str = "PKR";

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    // bcrypt hash
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone: Option<String>,
    pub currency: String,
    pub email_verified: bool,
    pub is_active: bool,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub last_login: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Upper-cased initials of every word in the name, e.g. "Ada Lovelace" -> "AL".
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}
