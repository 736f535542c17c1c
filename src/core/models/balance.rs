use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// One participant's position in a single transaction.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Split {
    pub participant: String,
    #[schema(value_type = f64)]
    pub owed_amount: Decimal,
    /// True for the payer: `owed_amount` is owed *to* them.
    pub is_owed: bool,
}

impl Split {
    /// Positive when the participant owes, negative when they are owed.
    pub fn signed_amount(&self) -> Decimal {
        if self.is_owed { -self.owed_amount } else { self.owed_amount }
    }
}

/// Positive `amount` means the counterparty owes the user.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CounterpartyBalance {
    pub counterparty: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

/// Group label to partial signed balance.
pub type BalanceBreakdown = BTreeMap<String, Decimal>;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BreakdownEntry {
    pub group: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

pub fn breakdown_entries(breakdown: &BalanceBreakdown) -> Vec<BreakdownEntry> {
    breakdown
        .iter()
        .map(|(group, amount)| BreakdownEntry {
            group: group.clone(),
            amount: *amount,
        })
        .collect()
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PairBalance {
    pub counterparty: String,
    #[schema(value_type = f64)]
    pub balance: Decimal,
    pub breakdown: Vec<BreakdownEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FriendBalance {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    #[schema(value_type = f64)]
    pub balance: Decimal,
    pub currency: String,
    pub breakdown: Vec<BreakdownEntry>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OverallBalance {
    /// What friends owe the user.
    #[schema(value_type = f64)]
    pub owed: Decimal,
    /// What the user owes friends.
    #[schema(value_type = f64)]
    pub owe: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FriendsOverview {
    pub friends: Vec<FriendBalance>,
    pub overall_balance: OverallBalance,
}

/// Rounds to minor currency units for display.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
