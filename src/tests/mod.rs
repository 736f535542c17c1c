mod balance_tests;
mod expense_tests;

use crate::config::AuthSettings;
use crate::core::models::transaction::{Category, SplitType, Transaction};
use crate::core::models::user::User;
use crate::core::services::{NewExpense, SignupInput, SplitMateService};
use crate::infrastructure::cache::in_memory::InMemoryCodeCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::mailer::in_memory::InMemoryMailer;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;

const TEST_BCRYPT_COST: u32 = 4;

pub type TestService = SplitMateService<InMemoryLogging, InMemoryStorage, InMemoryCodeCache, InMemoryMailer>;

pub fn test_auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: "test-secret".to_string(),
        token_ttl: Duration::from_secs(3600),
        bcrypt_cost: TEST_BCRYPT_COST,
    }
}

pub fn create_test_service() -> TestService {
    create_test_service_with(InMemoryCodeCache::new(Duration::from_secs(600), 100), InMemoryMailer::new())
}

pub fn create_test_service_with(codes: InMemoryCodeCache, mailer: InMemoryMailer) -> TestService {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    SplitMateService::new(storage, logging, codes, mailer, test_auth_settings())
}

pub async fn signup(service: &TestService, name: &str, email: &str) -> User {
    service
        .signup(SignupInput {
            name: name.to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            phone: None,
            currency: None,
        })
        .await
        .unwrap()
        .user
}

pub fn equal_expense(payer: &str, participants: &[&str], amount: Decimal) -> NewExpense {
    NewExpense {
        payer: payer.to_string(),
        participants: participants.iter().map(|p| p.to_string()).collect(),
        amount,
        currency: None,
        description: "Dinner".to_string(),
        category: Category::Food,
        group: None,
        date: None,
        split_type: SplitType::Equal,
        custom_splits: BTreeMap::new(),
        notes: None,
    }
}

/// Stored user record for tests that talk to storage directly.
pub fn stored_user(id: &str, name: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", id),
        password: String::new(),
        phone: None,
        currency: "PKR".to_string(),
        email_verified: false,
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn transaction(id: &str, payer: &str, participants: &[&str], amount: Decimal) -> Transaction {
    transaction_at(id, payer, participants, amount, Utc::now())
}

pub fn transaction_at(
    id: &str,
    payer: &str,
    participants: &[&str],
    amount: Decimal,
    date: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        payer: payer.to_string(),
        participants: participants.iter().map(|p| p.to_string()).collect(),
        amount,
        currency: "PKR".to_string(),
        description: format!("expense {}", id),
        category: Category::Other,
        group: None,
        date,
        split_type: SplitType::Equal,
        custom_splits: BTreeMap::new(),
        notes: None,
        is_settled: false,
        settled_at: None,
        created_at: date,
    }
}
