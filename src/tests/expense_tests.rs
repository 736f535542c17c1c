// src/tests/expense_tests.rs

use super::{create_test_service, equal_expense, signup};
use crate::constants::{EXPENSE_RECORDED, FRIENDSHIP_CREATED, GROUP_CREATED};
use crate::core::errors::SplitMateError;
use crate::core::models::transaction::SplitType;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

#[tokio::test]
async fn test_create_group_adds_creator_and_resolves_members() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;

    let group = service
        .create_group(
            " Trip ".to_string(),
            Some("Northern areas".to_string()),
            vec![bob.id.clone(), bob.id.clone(), alice.id.clone()],
            &alice.id,
        )
        .await
        .unwrap();

    assert_eq!(group.name, "Trip");
    assert_eq!(group.members, vec![alice.id.clone(), bob.id.clone()]);
    assert_eq!(group.created_by, alice.id);

    let bobs_groups = service.list_groups(&bob.id).await.unwrap();
    assert_eq!(bobs_groups.len(), 1);
    assert_eq!(bobs_groups[0].id, group.id);

    let logs = service.get_app_logs().await.unwrap();
    assert!(logs.iter().any(|l| l.action == GROUP_CREATED));
}

#[tokio::test]
async fn test_create_group_rejects_unknown_member_and_blank_name() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;

    let unknown = service
        .create_group("Trip".to_string(), None, vec!["ghost".to_string()], &alice.id)
        .await;
    assert!(matches!(unknown, Err(SplitMateError::UserNotFound(id)) if id == "ghost"));

    let blank = service.create_group("   ".to_string(), None, vec![], &alice.id).await;
    assert!(matches!(blank, Err(SplitMateError::InvalidInput(_, _))));
}

#[tokio::test]
async fn test_record_expense_creates_friendships_for_every_pair() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;
    let carol = signup(&service, "Carol", "carol@example.com").await;

    let tx = service
        .record_expense(
            equal_expense(&alice.id, &[&alice.id, &bob.id, &carol.id], dec!(90)),
            &alice.id,
        )
        .await
        .unwrap();
    assert_eq!(tx.currency, "PKR");
    assert!(!tx.is_settled);

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.iter().filter(|l| l.action == FRIENDSHIP_CREATED).count(), 3);
    assert_eq!(logs.iter().filter(|l| l.action == EXPENSE_RECORDED).count(), 1);

    // repeat pairs refresh instead of duplicating
    service
        .record_expense(equal_expense(&bob.id, &[&alice.id, &bob.id], dec!(10)), &bob.id)
        .await
        .unwrap();
    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.iter().filter(|l| l.action == FRIENDSHIP_CREATED).count(), 3);

    assert_eq!(service.get_friends(&bob.id).await.unwrap().friends.len(), 2);
}

#[tokio::test]
async fn test_record_expense_validation() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;
    let carol = signup(&service, "Carol", "carol@example.com").await;

    let outsider = service
        .record_expense(equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(10)), &carol.id)
        .await;
    assert!(matches!(outsider, Err(SplitMateError::NotTransactionParticipant(_))));

    let payer_missing = service
        .record_expense(equal_expense(&alice.id, &[&bob.id, &carol.id], dec!(10)), &bob.id)
        .await;
    assert!(matches!(payer_missing, Err(SplitMateError::PayerNotParticipant(_))));

    let zero = service
        .record_expense(equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(0)), &alice.id)
        .await;
    assert!(matches!(zero, Err(SplitMateError::NonPositiveAmount(_))));

    let fractional = service
        .record_expense(equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(10.005)), &alice.id)
        .await;
    assert!(matches!(fractional, Err(SplitMateError::InvalidInput(field, _)) if field == "amount"));

    let huge = service
        .record_expense(
            equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(70000000000000000000000000000)),
            &alice.id,
        )
        .await;
    assert!(matches!(huge, Err(SplitMateError::InvalidInput(field, _)) if field == "amount"));

    let unknown = service
        .record_expense(equal_expense(&alice.id, &[&alice.id, "ghost"], dec!(10)), &alice.id)
        .await;
    assert!(matches!(unknown, Err(SplitMateError::UserNotFound(_))));

    let mut bad_split = equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(10));
    bad_split.split_type = SplitType::Custom;
    bad_split.custom_splits = BTreeMap::from([(bob.id.clone(), dec!(4))]);
    let result = service.record_expense(bad_split, &alice.id).await;
    assert!(matches!(result, Err(SplitMateError::InvalidSplit(_))));

    assert!(service.list_transactions(&alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_group_expense_requires_membership() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;
    let carol = signup(&service, "Carol", "carol@example.com").await;
    let group = service
        .create_group("Flat".to_string(), None, vec![bob.id.clone()], &alice.id)
        .await
        .unwrap();

    let mut expense = equal_expense(&alice.id, &[&alice.id, &carol.id], dec!(30));
    expense.group = Some(group.id.clone());
    let result = service.record_expense(expense, &alice.id).await;
    assert!(matches!(result, Err(SplitMateError::NotGroupMember(id)) if id == carol.id));

    let mut expense = equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(30));
    expense.group = Some("missing".to_string());
    let result = service.record_expense(expense, &alice.id).await;
    assert!(matches!(result, Err(SplitMateError::GroupNotFound(_))));

    let mut expense = equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(30));
    expense.group = Some(group.id.clone());
    let tx = service.record_expense(expense, &alice.id).await.unwrap();
    assert_eq!(tx.group.as_deref(), Some(group.id.as_str()));
}

#[tokio::test]
async fn test_list_transactions_newest_first() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;

    let mut older = equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(10));
    older.date = Some(Utc::now() - Duration::days(2));
    older.description = "older".to_string();
    let mut newer = equal_expense(&bob.id, &[&alice.id, &bob.id], dec!(20));
    newer.date = Some(Utc::now() - Duration::days(1));
    newer.description = "newer".to_string();

    service.record_expense(older, &alice.id).await.unwrap();
    service.record_expense(newer, &bob.id).await.unwrap();

    let descriptions: Vec<String> = service
        .list_transactions(&alice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.description)
        .collect();
    assert_eq!(descriptions, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_transaction_splits_for_participants_only() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;
    let carol = signup(&service, "Carol", "carol@example.com").await;

    let mut expense = equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(200));
    expense.split_type = SplitType::Percentage;
    expense.custom_splits = BTreeMap::from([(alice.id.clone(), dec!(25)), (bob.id.clone(), dec!(75))]);
    let tx = service.record_expense(expense, &alice.id).await.unwrap();

    let splits = service.transaction_splits(&tx.id, &bob.id).await.unwrap();
    assert_eq!(splits.len(), 2);
    assert_eq!(splits[0].owed_amount, dec!(150));
    assert!(splits[0].is_owed);
    assert_eq!(splits[1].owed_amount, dec!(150));

    let outsider = service.transaction_splits(&tx.id, &carol.id).await;
    assert!(matches!(outsider, Err(SplitMateError::NotTransactionParticipant(_))));

    let missing = service.transaction_splits("nope", &bob.id).await;
    assert!(matches!(missing, Err(SplitMateError::TransactionNotFound(_))));
}

#[tokio::test]
async fn test_settle_transaction() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;
    let carol = signup(&service, "Carol", "carol@example.com").await;
    let tx = service
        .record_expense(equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(40)), &alice.id)
        .await
        .unwrap();

    let outsider = service.settle_transaction(&tx.id, &carol.id).await;
    assert!(matches!(outsider, Err(SplitMateError::NotTransactionParticipant(_))));

    let settled = service.settle_transaction(&tx.id, &bob.id).await.unwrap();
    assert!(settled.is_settled);
    assert!(settled.settled_at.is_some());

    let again = service.settle_transaction(&tx.id, &alice.id).await;
    assert!(matches!(again, Err(SplitMateError::TransactionAlreadySettled(_))));

    // settled expenses still feed the balance
    assert_eq!(service.balance_between(&alice.id, &bob.id).await.unwrap(), dec!(40));
}

#[tokio::test]
async fn test_delete_transaction_by_payer_only() {
    let service = create_test_service();
    let alice = signup(&service, "Alice", "alice@example.com").await;
    let bob = signup(&service, "Bob", "bob@example.com").await;
    let tx = service
        .record_expense(equal_expense(&alice.id, &[&alice.id, &bob.id], dec!(40)), &bob.id)
        .await
        .unwrap();

    let not_payer = service.delete_transaction(&tx.id, &bob.id).await;
    assert!(matches!(not_payer, Err(SplitMateError::NotTransactionPayer(_))));

    service.delete_transaction(&tx.id, &alice.id).await.unwrap();
    assert!(service.list_transactions(&alice.id).await.unwrap().is_empty());
    assert_eq!(
        service.balance_between(&alice.id, &bob.id).await.unwrap(),
        rust_decimal::Decimal::ZERO
    );

    let gone = service.delete_transaction(&tx.id, &alice.id).await;
    assert!(matches!(gone, Err(SplitMateError::TransactionNotFound(_))));
}
