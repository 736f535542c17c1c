use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    #[default]
    Equal,
    Percentage,
    Custom,
}

impl std::fmt::Display for SplitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SplitType::Equal => "equal",
            SplitType::Percentage => "percentage",
            SplitType::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Bills,
    #[default]
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: String,
    pub payer: String,
    /// Includes the payer.
    pub participants: Vec<String>,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub category: Category,
    /// `None` for an individual (non-group) expense.
    pub group: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    pub split_type: SplitType,
    /// Amounts for `custom`, percentages for `percentage`, empty for `equal`.
    #[schema(value_type = BTreeMap<String, f64>)]
    pub custom_splits: BTreeMap<String, Decimal>,
    pub notes: Option<String>,
    pub is_settled: bool,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub settled_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn involves(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Paid by one of the two users with the other one taking part.
    pub fn is_between(&self, user_a: &str, user_b: &str) -> bool {
        (self.payer == user_a && self.involves(user_b)) || (self.payer == user_b && self.involves(user_a))
    }
}
