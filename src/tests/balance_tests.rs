// src/tests/balance_tests.rs

use super::{stored_user, transaction};
use crate::constants::NON_GROUP_LABEL;
use crate::core::balance::BalanceEngine;
use crate::core::errors::SplitMateError;
use crate::core::models::balance::CounterpartyBalance;
use crate::core::models::group::Group;
use crate::core::models::transaction::{SplitType, Transaction};
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

async fn storage_with_users(ids: &[&str]) -> InMemoryStorage {
    let storage = InMemoryStorage::new();
    for id in ids {
        storage.create_user(stored_user(id, &id.to_uppercase())).await.unwrap();
    }
    storage
}

async fn save_group(storage: &InMemoryStorage, id: &str, name: &str, members: &[&str]) {
    storage
        .save_group(Group {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            members: members.iter().map(|m| m.to_string()).collect(),
            created_by: members[0].to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

fn in_group(mut tx: Transaction, group_id: &str) -> Transaction {
    tx.group = Some(group_id.to_string());
    tx
}

#[tokio::test]
async fn test_balance_between_moves_full_amount() {
    let storage = storage_with_users(&["a", "b"]).await;
    storage.save_transaction(transaction("t1", "a", &["a", "b"], dec!(100))).await.unwrap();
    storage.save_transaction(transaction("t2", "b", &["a", "b"], dec!(30))).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    assert_eq!(engine.balance_between("a", "b").await.unwrap(), dec!(70));
    assert_eq!(engine.balance_between("b", "a").await.unwrap(), dec!(-70));
}

#[tokio::test]
async fn test_balance_between_is_antisymmetric_with_many_participants() {
    let storage = storage_with_users(&["a", "b", "c"]).await;
    storage.save_transaction(transaction("t1", "a", &["a", "b", "c"], dec!(90))).await.unwrap();
    storage.save_transaction(transaction("t2", "c", &["a", "b", "c"], dec!(45.50))).await.unwrap();
    storage.save_transaction(transaction("t3", "b", &["b", "c"], dec!(12))).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    for (x, y) in [("a", "b"), ("a", "c"), ("b", "c")] {
        let forward = engine.balance_between(x, y).await.unwrap();
        let backward = engine.balance_between(y, x).await.unwrap();
        assert_eq!(forward, -backward, "pair {}/{}", x, y);
    }
    assert_eq!(engine.balance_between("a", "c").await.unwrap(), dec!(44.50));
    assert_eq!(engine.balance_between("b", "c").await.unwrap(), dec!(-33.50));
}

#[tokio::test]
async fn test_transactions_paid_by_third_party_are_ignored() {
    let storage = storage_with_users(&["a", "b", "c"]).await;
    storage.save_transaction(transaction("t1", "c", &["a", "b", "c"], dec!(60))).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    assert_eq!(engine.balance_between("a", "b").await.unwrap(), Decimal::ZERO);
    assert!(engine.balance_breakdown("a", "b").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_shared_transactions_gives_zero() {
    let storage = storage_with_users(&["a", "b"]).await;
    let engine = BalanceEngine::new(&storage);

    assert_eq!(engine.balance_between("a", "b").await.unwrap(), Decimal::ZERO);
    assert!(engine.balance_breakdown("a", "b").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_breakdown_groups_by_label_and_sums_to_balance() {
    let storage = storage_with_users(&["a", "b"]).await;
    save_group(&storage, "g1", "Trip", &["a", "b"]).await;
    storage
        .save_transaction(in_group(transaction("t1", "a", &["a", "b"], dec!(100)), "g1"))
        .await
        .unwrap();
    storage
        .save_transaction(in_group(transaction("t2", "b", &["a", "b"], dec!(40)), "g1"))
        .await
        .unwrap();
    storage.save_transaction(transaction("t3", "b", &["a", "b"], dec!(25))).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    let breakdown = engine.balance_breakdown("a", "b").await.unwrap();

    assert_eq!(
        breakdown,
        BTreeMap::from([("Trip".to_string(), dec!(60)), (NON_GROUP_LABEL.to_string(), dec!(-25))])
    );
    let total: Decimal = breakdown.values().copied().sum();
    assert_eq!(total, engine.balance_between("a", "b").await.unwrap());
}

#[tokio::test]
async fn test_breakdown_falls_back_to_group_id_for_unknown_group() {
    let storage = storage_with_users(&["a", "b"]).await;
    storage
        .save_transaction(in_group(transaction("t1", "b", &["a", "b"], dec!(10)), "g-gone"))
        .await
        .unwrap();

    let engine = BalanceEngine::new(&storage);
    let breakdown = engine.balance_breakdown("a", "b").await.unwrap();
    assert_eq!(breakdown.get("g-gone"), Some(&dec!(-10)));
}

#[tokio::test]
async fn test_breakdown_merges_groups_with_the_same_name() {
    let storage = storage_with_users(&["a", "b"]).await;
    save_group(&storage, "g1", "Trip", &["a", "b"]).await;
    save_group(&storage, "g2", "Trip", &["a", "b"]).await;
    storage
        .save_transaction(in_group(transaction("t1", "a", &["a", "b"], dec!(50)), "g1"))
        .await
        .unwrap();
    storage
        .save_transaction(in_group(transaction("t2", "b", &["a", "b"], dec!(20)), "g2"))
        .await
        .unwrap();

    let engine = BalanceEngine::new(&storage);
    let breakdown = engine.balance_breakdown("a", "b").await.unwrap();
    assert_eq!(breakdown, BTreeMap::from([("Trip".to_string(), dec!(30))]));
}

#[tokio::test]
async fn test_balance_overflow_is_an_error() {
    let storage = storage_with_users(&["a", "b"]).await;
    for id in ["t1", "t2", "t3", "t4"] {
        storage
            .save_transaction(transaction(id, "a", &["a", "b"], dec!(50000000000000000000000000000)))
            .await
            .unwrap();
    }

    let engine = BalanceEngine::new(&storage);
    let between = engine.balance_between("a", "b").await;
    assert!(matches!(between, Err(SplitMateError::AmountOverflow(_))));
    let breakdown = engine.balance_breakdown("a", "b").await;
    assert!(matches!(breakdown, Err(SplitMateError::AmountOverflow(_))));
    let all = engine.all_balances("a").await;
    assert!(matches!(all, Err(SplitMateError::AmountOverflow(_))));
}

#[tokio::test]
async fn test_settled_transactions_still_count() {
    let storage = storage_with_users(&["a", "b"]).await;
    let mut tx = transaction("t1", "a", &["a", "b"], dec!(50));
    tx.is_settled = true;
    tx.settled_at = Some(Utc::now());
    storage.save_transaction(tx).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    assert_eq!(engine.balance_between("a", "b").await.unwrap(), dec!(50));
}

#[tokio::test]
async fn test_all_balances_accumulates_split_entries() {
    let storage = storage_with_users(&["a", "b", "c"]).await;
    storage.save_transaction(transaction("t1", "a", &["a", "b", "c"], dec!(90))).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    assert_eq!(
        engine.all_balances("a").await.unwrap(),
        vec![
            CounterpartyBalance { counterparty: "b".to_string(), amount: dec!(30) },
            CounterpartyBalance { counterparty: "c".to_string(), amount: dec!(30) },
        ]
    );
    // the payer's entry counts against b, the other non-payer's share in b's favour
    assert_eq!(
        engine.all_balances("b").await.unwrap(),
        vec![
            CounterpartyBalance { counterparty: "a".to_string(), amount: dec!(-60) },
            CounterpartyBalance { counterparty: "c".to_string(), amount: dec!(30) },
        ]
    );
}

#[tokio::test]
async fn test_all_balances_with_custom_split() {
    let storage = storage_with_users(&["a", "b"]).await;
    let mut tx = transaction("t1", "b", &["a", "b"], dec!(100));
    tx.split_type = SplitType::Custom;
    tx.custom_splits = BTreeMap::from([("a".to_string(), dec!(75)), ("b".to_string(), dec!(25))]);
    storage.save_transaction(tx).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    assert_eq!(
        engine.all_balances("a").await.unwrap(),
        vec![CounterpartyBalance { counterparty: "b".to_string(), amount: dec!(-75) }]
    );
}

#[tokio::test]
async fn test_all_balances_empty_for_user_without_transactions() {
    let storage = storage_with_users(&["a"]).await;
    let engine = BalanceEngine::new(&storage);
    assert!(engine.all_balances("a").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_self_balance_is_rejected() {
    let storage = storage_with_users(&["a"]).await;
    let engine = BalanceEngine::new(&storage);

    assert!(matches!(
        engine.balance_between("a", "a").await,
        Err(SplitMateError::SelfBalance(_))
    ));
    assert!(matches!(
        engine.balance_breakdown("a", "a").await,
        Err(SplitMateError::SelfBalance(_))
    ));
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let storage = storage_with_users(&["a"]).await;
    let engine = BalanceEngine::new(&storage);

    assert!(matches!(
        engine.balance_between("a", "ghost").await,
        Err(SplitMateError::UserNotFound(id)) if id == "ghost"
    ));
    assert!(matches!(
        engine.all_balances("ghost").await,
        Err(SplitMateError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_invalid_stored_transaction_fails_loudly() {
    let storage = storage_with_users(&["a", "b"]).await;
    storage.save_transaction(transaction("t1", "a", &["a", "b", "b"], dec!(10))).await.unwrap();

    let engine = BalanceEngine::new(&storage);
    assert!(matches!(
        engine.balance_between("a", "b").await,
        Err(SplitMateError::DuplicateParticipant(_))
    ));
    assert!(matches!(
        engine.all_balances("a").await,
        Err(SplitMateError::DuplicateParticipant(_))
    ));
}
