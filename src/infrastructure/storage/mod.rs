pub mod in_memory;

use crate::core::balance::TransactionSource;
use crate::core::errors::SplitMateError;
use crate::core::models::{friendship::Friendship, group::Group, transaction::Transaction, user::User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait Storage: TransactionSource + Send + Sync {
    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn create_user(&self, user: User) -> Result<User, SplitMateError>;
    /// Replaces an existing user; the email index is left untouched.
    async fn update_user(&self, user: User) -> Result<(), SplitMateError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SplitMateError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SplitMateError>;
    /// Case-insensitive substring match on name or email, `exclude` left out.
    async fn search_users(&self, query: &str, exclude: &str) -> Result<Vec<User>, SplitMateError>;

    async fn save_group(&self, group: Group) -> Result<(), SplitMateError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SplitMateError>;
    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, SplitMateError>;

    async fn save_transaction(&self, transaction: Transaction) -> Result<(), SplitMateError>;
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>, SplitMateError>;
    async fn delete_transaction(&self, transaction_id: &str) -> Result<(), SplitMateError>;

    /// Creates the friendship for the unordered pair or refreshes its last interaction.
    /// Returns the record and whether it was newly created.
    async fn upsert_friendship(
        &self,
        user_a: &str,
        user_b: &str,
        at: DateTime<Utc>,
    ) -> Result<(Friendship, bool), SplitMateError>;
    async fn get_friendship(&self, user_a: &str, user_b: &str) -> Result<Option<Friendship>, SplitMateError>;
    async fn get_friendships(&self, user_id: &str) -> Result<Vec<Friendship>, SplitMateError>;
}
