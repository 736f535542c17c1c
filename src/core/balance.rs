//! Balance Engine: net balances between users and per-transaction split shares.
//!
//! Two accumulation rules coexist:
//! [`BalanceEngine::balance_between`] and [`BalanceEngine::balance_breakdown`] move the
//! *full* transaction amount between the payer and the counterparty, while
//! [`BalanceEngine::all_balances`] accumulates the per-participant entries produced by
//! [`calculate_splits`]. The two generally disagree for transactions with more than
//! two participants.

use crate::constants::NON_GROUP_LABEL;
use crate::core::errors::SplitMateError;
use crate::core::models::{
    balance::{BalanceBreakdown, CounterpartyBalance, Split},
    transaction::{SplitType, Transaction},
};
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Decimal places kept on computed (equal / percentage) shares.
pub const SHARE_SCALE: u32 = 8;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Overflow-checked addition of two money values.
pub fn add_amounts(a: Decimal, b: Decimal) -> Result<Decimal, SplitMateError> {
    a.checked_add(b)
        .ok_or_else(|| SplitMateError::AmountOverflow(format!("{} + {}", a, b)))
}

/// Read side the engine consumes. Implementations return complete snapshots.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Every transaction listing `user_id` as a participant.
    async fn fetch_transactions_involving(&self, user_id: &str) -> Result<Vec<Transaction>, SplitMateError>;
    /// Every transaction paid by one of the two users in which the other participates.
    async fn fetch_transactions_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<Transaction>, SplitMateError>;
    async fn fetch_group_name(&self, group_id: &str) -> Result<Option<String>, SplitMateError>;
    async fn user_exists(&self, user_id: &str) -> Result<bool, SplitMateError>;
}

/// Rejects transactions that would produce a silently wrong balance.
pub fn validate_transaction(transaction: &Transaction) -> Result<(), SplitMateError> {
    if transaction.amount <= Decimal::ZERO {
        return Err(SplitMateError::NonPositiveAmount(transaction.amount.to_string()));
    }
    if transaction.participants.is_empty() {
        return Err(SplitMateError::EmptyParticipants);
    }

    let mut seen = HashSet::with_capacity(transaction.participants.len());
    for participant in &transaction.participants {
        if !seen.insert(participant.as_str()) {
            return Err(SplitMateError::DuplicateParticipant(participant.clone()));
        }
    }
    if !seen.contains(transaction.payer.as_str()) {
        return Err(SplitMateError::PayerNotParticipant(transaction.payer.clone()));
    }

    match transaction.split_type {
        SplitType::Equal => Ok(()),
        SplitType::Custom => {
            let sum = checked_split_values(transaction, &seen, None)?;
            if sum != transaction.amount {
                return Err(SplitMateError::InvalidSplit(format!(
                    "custom splits sum to {} but the amount is {}",
                    sum, transaction.amount
                )));
            }
            Ok(())
        }
        SplitType::Percentage => {
            let sum = checked_split_values(transaction, &seen, Some(HUNDRED))?;
            if sum != HUNDRED {
                return Err(SplitMateError::InvalidSplit(format!(
                    "percentages sum to {} instead of 100",
                    sum
                )));
            }
            Ok(())
        }
    }
}

fn checked_split_values(
    transaction: &Transaction,
    participants: &HashSet<&str>,
    upper_bound: Option<Decimal>,
) -> Result<Decimal, SplitMateError> {
    let mut sum = Decimal::ZERO;
    for (user_id, value) in &transaction.custom_splits {
        if !participants.contains(user_id.as_str()) {
            return Err(SplitMateError::InvalidSplit(format!("{} is not a participant", user_id)));
        }
        if value.is_sign_negative() || upper_bound.is_some_and(|max| *value > max) {
            return Err(SplitMateError::InvalidSplit(format!(
                "{} is out of range for {}",
                value, user_id
            )));
        }
        sum = add_amounts(sum, *value)?;
    }
    Ok(sum)
}

/// Who owes what for a single transaction.
///
/// Every non-payer participant gets an entry with `is_owed = false`; the payer gets one
/// entry with `is_owed = true` carrying the sum of everybody else's share, so the
/// signed amounts always add up to zero. A transaction whose only participant is the
/// payer yields a single zero entry for the payer.
pub fn calculate_splits(transaction: &Transaction) -> Result<Vec<Split>, SplitMateError> {
    validate_transaction(transaction)?;

    let share_of = |participant: &str| -> Result<Decimal, SplitMateError> {
        let share = match transaction.split_type {
            SplitType::Equal => {
                let count = Decimal::from(transaction.participants.len());
                (transaction.amount / count).round_dp_with_strategy(SHARE_SCALE, RoundingStrategy::MidpointAwayFromZero)
            }
            SplitType::Custom => transaction
                .custom_splits
                .get(participant)
                .copied()
                .unwrap_or(Decimal::ZERO),
            SplitType::Percentage => {
                let pct = transaction
                    .custom_splits
                    .get(participant)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                // pct / 100 <= 1, so the product never exceeds the amount
                transaction
                    .amount
                    .checked_mul(pct / HUNDRED)
                    .ok_or_else(|| SplitMateError::AmountOverflow(format!("{} * {}%", transaction.amount, pct)))?
                    .round_dp_with_strategy(SHARE_SCALE, RoundingStrategy::MidpointAwayFromZero)
            }
        };
        Ok(share)
    };

    let mut others = Vec::with_capacity(transaction.participants.len());
    let mut owed_to_payer = Decimal::ZERO;
    for participant in &transaction.participants {
        if *participant != transaction.payer {
            let share = share_of(participant.as_str())?;
            owed_to_payer = add_amounts(owed_to_payer, share)?;
            others.push(share);
        }
    }

    let mut shares = others.into_iter();
    Ok(transaction
        .participants
        .iter()
        .map(|participant| {
            if *participant == transaction.payer {
                Split {
                    participant: participant.clone(),
                    owed_amount: owed_to_payer,
                    is_owed: true,
                }
            } else {
                let owed_amount = shares.next().unwrap_or(Decimal::ZERO);
                Split {
                    participant: participant.clone(),
                    owed_amount,
                    is_owed: false,
                }
            }
        })
        .collect())
}

/// Stateless view over a [`TransactionSource`]; every call rescans the source.
pub struct BalanceEngine<'a, T: TransactionSource + ?Sized> {
    source: &'a T,
}

impl<'a, T: TransactionSource + ?Sized> BalanceEngine<'a, T> {
    pub fn new(source: &'a T) -> Self {
        BalanceEngine { source }
    }

    /// Net balance of `user_a` toward `user_b`; positive means `user_b` owes `user_a`.
    pub async fn balance_between(&self, user_a: &str, user_b: &str) -> Result<Decimal, SplitMateError> {
        let transactions = self.pair_transactions(user_a, user_b).await?;
        let total = transactions
            .iter()
            .try_fold(Decimal::ZERO, |acc, t| add_amounts(acc, directed_amount(t, user_a)))?;
        debug!(user_a, user_b, count = transactions.len(), %total, "computed pair balance");
        Ok(total)
    }

    /// Same transactions as [`Self::balance_between`], accumulated per group label.
    ///
    /// Keys are display labels, so two groups sharing a name merge into one entry.
    pub async fn balance_breakdown(&self, user_a: &str, user_b: &str) -> Result<BalanceBreakdown, SplitMateError> {
        let transactions = self.pair_transactions(user_a, user_b).await?;
        let mut labels: HashMap<String, String> = HashMap::new();
        let mut breakdown = BalanceBreakdown::new();

        for transaction in &transactions {
            let label = match &transaction.group {
                None => NON_GROUP_LABEL.to_string(),
                Some(group_id) => match labels.get(group_id) {
                    Some(label) => label.clone(),
                    None => {
                        let label = self
                            .source
                            .fetch_group_name(group_id)
                            .await?
                            .unwrap_or_else(|| group_id.clone());
                        labels.insert(group_id.clone(), label.clone());
                        label
                    }
                },
            };
            let entry = breakdown.entry(label).or_insert(Decimal::ZERO);
            *entry = add_amounts(*entry, directed_amount(transaction, user_a))?;
        }
        Ok(breakdown)
    }

    /// Per-counterparty totals of the split entries of every transaction `user_id` takes part in.
    pub async fn all_balances(&self, user_id: &str) -> Result<Vec<CounterpartyBalance>, SplitMateError> {
        if !self.source.user_exists(user_id).await? {
            return Err(SplitMateError::UserNotFound(user_id.to_string()));
        }

        let transactions = self.source.fetch_transactions_involving(user_id).await?;
        let mut balances: BTreeMap<String, Decimal> = BTreeMap::new();
        for transaction in transactions.iter().filter(|t| t.involves(user_id)) {
            for split in calculate_splits(transaction)? {
                if split.participant != user_id {
                    let entry = balances.entry(split.participant.clone()).or_insert(Decimal::ZERO);
                    *entry = add_amounts(*entry, split.signed_amount())?;
                }
            }
        }

        Ok(balances
            .into_iter()
            .map(|(counterparty, amount)| CounterpartyBalance { counterparty, amount })
            .collect())
    }

    async fn pair_transactions(&self, user_a: &str, user_b: &str) -> Result<Vec<Transaction>, SplitMateError> {
        if user_a == user_b {
            return Err(SplitMateError::SelfBalance(user_a.to_string()));
        }
        for user_id in [user_a, user_b] {
            if !self.source.user_exists(user_id).await? {
                return Err(SplitMateError::UserNotFound(user_id.to_string()));
            }
        }

        let transactions: Vec<Transaction> = self
            .source
            .fetch_transactions_between(user_a, user_b)
            .await?
            .into_iter()
            .filter(|t| t.is_between(user_a, user_b))
            .collect();
        for transaction in &transactions {
            validate_transaction(transaction)?;
        }
        Ok(transactions)
    }
}

fn directed_amount(transaction: &Transaction, user_a: &str) -> Decimal {
    if transaction.payer == user_a {
        transaction.amount
    } else {
        -transaction.amount
    }
}
