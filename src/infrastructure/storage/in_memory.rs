use crate::core::balance::TransactionSource;
use crate::core::errors::SplitMateError;
use crate::core::models::{
    friendship::{Friendship, FriendshipStatus},
    group::Group,
    transaction::Transaction,
    user::User,
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    user_ids_by_email: Arc<RwLock<HashMap<String, String>>>,
    groups: Arc<RwLock<HashMap<String, Group>>>,
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
    friendships: Arc<RwLock<HashMap<(String, String), Friendship>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionSource for InMemoryStorage {
    async fn fetch_transactions_involving(&self, user_id: &str) -> Result<Vec<Transaction>, SplitMateError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.values().filter(|t| t.involves(user_id)).cloned().collect())
    }

    async fn fetch_transactions_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<Transaction>, SplitMateError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|t| t.is_between(user_a, user_b))
            .cloned()
            .collect())
    }

    async fn fetch_group_name(&self, group_id: &str) -> Result<Option<String>, SplitMateError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).map(|g| g.name.clone()))
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool, SplitMateError> {
        let users = self.users.read().await;
        Ok(users.contains_key(user_id))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, SplitMateError> {
        let mut user_ids_by_email = self.user_ids_by_email.write().await;
        if user_ids_by_email.contains_key(&user.email) {
            return Err(SplitMateError::EmailAlreadyRegistered(user.email));
        }
        user_ids_by_email.insert(user.email.clone(), user.id.clone());
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<(), SplitMateError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(SplitMateError::UserNotFound(user.id)),
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SplitMateError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SplitMateError> {
        let user_ids_by_email = self.user_ids_by_email.read().await;
        let users = self.users.read().await;
        Ok(user_ids_by_email.get(email).and_then(|id| users.get(id).cloned()))
    }

    async fn search_users(&self, query: &str, exclude: &str) -> Result<Vec<User>, SplitMateError> {
        let needle = query.to_lowercase();
        let users = self.users.read().await;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| u.id != exclude)
            .filter(|u| u.name.to_lowercase().contains(&needle) || u.email.contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn save_group(&self, group: Group) -> Result<(), SplitMateError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SplitMateError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, SplitMateError> {
        let groups = self.groups.read().await;
        let mut found: Vec<Group> = groups.values().filter(|g| g.is_member(user_id)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn save_transaction(&self, transaction: Transaction) -> Result<(), SplitMateError> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(transaction.id.clone(), transaction);
        Ok(())
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>, SplitMateError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(transaction_id).cloned())
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<(), SplitMateError> {
        let mut transactions = self.transactions.write().await;
        transactions
            .remove(transaction_id)
            .map(|_| ())
            .ok_or_else(|| SplitMateError::TransactionNotFound(transaction_id.to_string()))
    }

    async fn upsert_friendship(
        &self,
        user_a: &str,
        user_b: &str,
        at: DateTime<Utc>,
    ) -> Result<(Friendship, bool), SplitMateError> {
        let key = Friendship::pair_key(user_a, user_b);
        let mut friendships = self.friendships.write().await;
        if let Some(existing) = friendships.get_mut(&key) {
            existing.last_interaction = at;
            existing.has_transactions = true;
            return Ok((existing.clone(), false));
        }

        let friendship = Friendship {
            id: Uuid::new_v4().to_string(),
            user1: key.0.clone(),
            user2: key.1.clone(),
            status: FriendshipStatus::Accepted,
            has_transactions: true,
            last_interaction: at,
            created_at: at,
        };
        friendships.insert(key, friendship.clone());
        Ok((friendship, true))
    }

    async fn get_friendship(&self, user_a: &str, user_b: &str) -> Result<Option<Friendship>, SplitMateError> {
        let friendships = self.friendships.read().await;
        Ok(friendships.get(&Friendship::pair_key(user_a, user_b)).cloned())
    }

    async fn get_friendships(&self, user_id: &str) -> Result<Vec<Friendship>, SplitMateError> {
        let friendships = self.friendships.read().await;
        let mut found: Vec<Friendship> = friendships.values().filter(|f| f.includes(user_id)).cloned().collect();
        found.sort_by(|a, b| b.last_interaction.cmp(&a.last_interaction));
        Ok(found)
    }
}
