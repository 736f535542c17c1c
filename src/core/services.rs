use crate::auth::jwt::{Claims, JwtService};
use crate::config::AuthSettings;
use crate::constants::{
    EMAIL_VERIFIED, EXPENSE_RECORDED, FRIENDSHIP_CREATED, GROUP_CREATED, MIN_SEARCH_QUERY_LEN, PASSWORD_CHANGED,
    PROFILE_UPDATED, TRANSACTION_DELETED, TRANSACTION_SETTLED, USER_LOGGED_IN, USER_SIGNED_UP,
    VERIFICATION_CODE_SENT,
};
use crate::core::balance::{BalanceEngine, add_amounts, calculate_splits, validate_transaction};
use crate::core::errors::SplitMateError;
use crate::core::models::{
    audit::AppLog,
    balance::{
        BalanceBreakdown, CounterpartyBalance, FriendBalance, FriendsOverview, OverallBalance, PairBalance, Split,
        breakdown_entries, round_money,
    },
    group::Group,
    transaction::{Category, SplitType, Transaction},
    user::{DEFAULT_CURRENCY, SUPPORTED_CURRENCIES, User},
};
use crate::infrastructure::cache::{CodeCache, generate_code};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::mailer::Mailer;
use crate::infrastructure::storage::Storage;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

const NAME_MIN_LEN: usize = 2;
const NAME_MAX_LEN: usize = 50;
const PASSWORD_MIN_LEN: usize = 6;
const GROUP_NAME_MAX_LEN: usize = 100;
const DESCRIPTION_MAX_LEN: usize = 500;
const EXPENSE_DESCRIPTION_MAX_LEN: usize = 200;
const NOTES_MAX_LEN: usize = 500;
const MAX_AMOUNT_SCALE: u32 = 2;
const MAX_AMOUNT: i64 = 1_000_000_000_000;

#[derive(Clone, Debug)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub currency: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewExpense {
    pub payer: String,
    pub participants: Vec<String>,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub description: String,
    pub category: Category,
    pub group: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub split_type: SplitType,
    pub custom_splits: BTreeMap<String, Decimal>,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct UserSearchResult {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_friend: bool,
}

pub struct SplitMateService<L: LoggingService, S: Storage, C: CodeCache, M: Mailer> {
    storage: S,
    logging: L,
    codes: C,
    mailer: M,
    jwt_service: JwtService,
    bcrypt_cost: u32,
}

impl<L: LoggingService, S: Storage, C: CodeCache, M: Mailer> SplitMateService<L, S, C, M> {
    pub fn new(storage: S, logging: L, codes: C, mailer: M, auth: AuthSettings) -> Self {
        SplitMateService {
            storage,
            logging,
            codes,
            mailer,
            jwt_service: JwtService::new(&auth.jwt_secret, auth.token_ttl),
            bcrypt_cost: auth.bcrypt_cost,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, SplitMateError> {
        self.jwt_service.validate_token(token)
    }

    async fn require_user(&self, user_id: &str) -> Result<User, SplitMateError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| SplitMateError::UserNotFound(user_id.to_string()))
    }

    async fn require_transaction(&self, transaction_id: &str) -> Result<Transaction, SplitMateError> {
        self.storage
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| SplitMateError::TransactionNotFound(transaction_id.to_string()))
    }

    async fn audit(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SplitMateError> {
        self.logging.log_action(action, details, user_id).await
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), SplitMateError> {
        if value.trim().is_empty() {
            return Err(SplitMateError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(SplitMateError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(SplitMateError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_optional_input(&self, field: &str, value: &Option<String>, max_length: usize) -> Result<(), SplitMateError> {
        match value {
            Some(v) if v.chars().count() > max_length => Err(SplitMateError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            )),
            _ => Ok(()),
        }
    }

    fn validate_name(&self, name: &str) -> Result<(), SplitMateError> {
        self.validate_string_input("name", name, NAME_MAX_LEN)?;
        if name.chars().count() < NAME_MIN_LEN {
            return Err(SplitMateError::invalid_input(
                "name",
                "Invalid name",
                format!("name must be between {} and {} characters", NAME_MIN_LEN, NAME_MAX_LEN),
            ));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), SplitMateError> {
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(SplitMateError::invalid_input(
                "password",
                "Invalid password",
                format!("password must be at least {} characters long", PASSWORD_MIN_LEN),
            ));
        }
        Ok(())
    }

    fn validate_phone(&self, phone: &str) -> Result<(), SplitMateError> {
        let digits = phone.strip_prefix('+').unwrap_or(phone);
        let valid = !digits.is_empty()
            && digits.len() <= 16
            && digits.chars().all(|c| c.is_ascii_digit())
            && !digits.starts_with('0');
        if !valid {
            return Err(SplitMateError::invalid_input(
                "phone",
                "Invalid phone",
                "please provide a valid phone number",
            ));
        }
        Ok(())
    }

    fn validate_currency(&self, currency: &str) -> Result<(), SplitMateError> {
        if !SUPPORTED_CURRENCIES.contains(&currency) {
            return Err(SplitMateError::invalid_input(
                "currency",
                "Invalid currency",
                format!("currency must be one of {}", SUPPORTED_CURRENCIES.join(", ")),
            ));
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, SplitMateError> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| SplitMateError::InternalServerError(format!("Password hashing error: {}", e)))
    }

    fn verify_password(&self, password: &str, user: &User) -> Result<bool, SplitMateError> {
        bcrypt::verify(password, &user.password)
            .map_err(|e| SplitMateError::InternalServerError(format!("Password verification error: {}", e)))
    }

    // AUTH

    pub async fn signup(&self, input: SignupInput) -> Result<AuthSession, SplitMateError> {
        let name = sanitize_name(&input.name);
        self.validate_name(&name)?;
        let email = normalize_email(&input.email)?;
        self.validate_password(&input.password)?;
        if let Some(phone) = &input.phone {
            self.validate_phone(phone)?;
        }
        let currency = input.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        self.validate_currency(&currency)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password: self.hash_password(&input.password)?,
            phone: input.phone,
            currency,
            email_verified: false,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let user = self.storage.create_user(user).await?;
        info!(user_id = %user.id, "user signed up");

        self.audit(
            USER_SIGNED_UP,
            json!({ "user_id": user.id, "email": user.email }),
            Some(user.id.as_str()),
        )
        .await?;

        let token = self.jwt_service.generate_token(&user.id)?;
        Ok(AuthSession { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, SplitMateError> {
        let email = email.trim().to_lowercase();
        let mut user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or(SplitMateError::InvalidCredentials)?;

        if !user.is_active || !self.verify_password(password, &user)? {
            return Err(SplitMateError::InvalidCredentials);
        }

        user.last_login = Some(Utc::now());
        self.storage.update_user(user.clone()).await?;
        self.audit(USER_LOGGED_IN, json!({ "user_id": user.id }), Some(user.id.as_str()))
            .await?;

        let token = self.jwt_service.generate_token(&user.id)?;
        Ok(AuthSession { user, token })
    }

    pub async fn get_me(&self, user_id: &str) -> Result<User, SplitMateError> {
        self.require_user(user_id).await
    }

    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User, SplitMateError> {
        let mut user = self.require_user(user_id).await?;

        if let Some(name) = update.name {
            let name = sanitize_name(&name);
            self.validate_name(&name)?;
            user.name = name;
        }
        if let Some(phone) = update.phone {
            self.validate_phone(&phone)?;
            user.phone = Some(phone);
        }
        if let Some(currency) = update.currency {
            self.validate_currency(&currency)?;
            user.currency = currency;
        }
        user.updated_at = Utc::now();
        self.storage.update_user(user.clone()).await?;

        self.audit(
            PROFILE_UPDATED,
            json!({ "user_id": user.id, "name": user.name, "currency": user.currency }),
            Some(user_id),
        )
        .await?;
        Ok(user)
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), SplitMateError> {
        let mut user = self.require_user(user_id).await?;
        if !self.verify_password(current_password, &user)? {
            return Err(SplitMateError::InvalidCredentials);
        }
        self.validate_password(new_password)?;

        user.password = self.hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.storage.update_user(user).await?;

        self.audit(PASSWORD_CHANGED, json!({ "user_id": user_id }), Some(user_id))
            .await
    }

    pub async fn send_verification_code(&self, email: &str) -> Result<(), SplitMateError> {
        let email = normalize_email(email)?;
        let user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| SplitMateError::UserNotFound(email.clone()))?;
        if user.email_verified {
            return Err(SplitMateError::EmailAlreadyVerified(email));
        }

        let code = generate_code();
        self.codes.store_code(&email, &code).await?;
        self.mailer.send_verification_code(&email, &code).await?;

        self.audit(
            VERIFICATION_CODE_SENT,
            json!({ "user_id": user.id, "email": email }),
            Some(user.id.as_str()),
        )
        .await
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<User, SplitMateError> {
        let email = normalize_email(email)?;
        let mut user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| SplitMateError::UserNotFound(email.clone()))?;
        if user.email_verified {
            return Err(SplitMateError::EmailAlreadyVerified(email));
        }

        self.codes.verify_code(&email, code.trim()).await?;

        user.email_verified = true;
        user.updated_at = Utc::now();
        self.storage.update_user(user.clone()).await?;

        self.audit(
            EMAIL_VERIFIED,
            json!({ "user_id": user.id, "email": email }),
            Some(user.id.as_str()),
        )
        .await?;
        Ok(user)
    }

    // GROUPS

    pub async fn create_group(
        &self,
        name: String,
        description: Option<String>,
        member_ids: Vec<String>,
        created_by: &str,
    ) -> Result<Group, SplitMateError> {
        let creator = self.require_user(created_by).await?;
        let name = name.trim().to_string();
        self.validate_string_input("name", &name, GROUP_NAME_MAX_LEN)?;
        self.validate_optional_input("description", &description, DESCRIPTION_MAX_LEN)?;

        let mut seen = HashSet::new();
        let unique_ids: Vec<String> = member_ids
            .into_iter()
            .filter(|id| *id != creator.id && seen.insert(id.clone()))
            .collect();
        let lookups = unique_ids.iter().map(|id| self.require_user(id));
        let members = futures::future::try_join_all(lookups).await?;

        let mut member_ids: Vec<String> = vec![creator.id.clone()];
        member_ids.extend(members.into_iter().map(|u| u.id));

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            members: member_ids,
            created_by: creator.id.clone(),
            created_at: Utc::now(),
        };
        self.storage.save_group(group.clone()).await?;

        self.audit(
            GROUP_CREATED,
            json!({ "group_id": group.id, "name": group.name, "member_ids": group.members }),
            Some(created_by),
        )
        .await?;
        Ok(group)
    }

    pub async fn list_groups(&self, user_id: &str) -> Result<Vec<Group>, SplitMateError> {
        self.require_user(user_id).await?;
        self.storage.get_user_groups(user_id).await
    }

    // EXPENSES

    pub async fn record_expense(&self, expense: NewExpense, recorded_by: &str) -> Result<Transaction, SplitMateError> {
        let recorder = self.require_user(recorded_by).await?;
        let description = expense.description.trim().to_string();
        self.validate_string_input("description", &description, EXPENSE_DESCRIPTION_MAX_LEN)?;
        self.validate_optional_input("notes", &expense.notes, NOTES_MAX_LEN)?;
        if expense.amount.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(SplitMateError::invalid_input(
                "amount",
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        if expense.amount > Decimal::from(MAX_AMOUNT) {
            return Err(SplitMateError::invalid_input(
                "amount",
                "Invalid Amount",
                format!("Amount cannot exceed {}", MAX_AMOUNT),
            ));
        }
        let currency = expense.currency.unwrap_or_else(|| recorder.currency.clone());
        self.validate_currency(&currency)?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            payer: expense.payer,
            participants: expense.participants,
            amount: expense.amount,
            currency,
            description,
            category: expense.category,
            group: expense.group,
            date: expense.date.unwrap_or(now),
            split_type: expense.split_type,
            custom_splits: expense.custom_splits,
            notes: expense.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            is_settled: false,
            settled_at: None,
            created_at: now,
        };
        validate_transaction(&transaction)?;

        if !transaction.involves(&recorder.id) {
            return Err(SplitMateError::NotTransactionParticipant(recorder.id));
        }
        for participant in &transaction.participants {
            self.require_user(participant).await?;
        }
        if let Some(group_id) = &transaction.group {
            let group = self
                .storage
                .get_group(group_id)
                .await?
                .ok_or_else(|| SplitMateError::GroupNotFound(group_id.clone()))?;
            if let Some(outsider) = transaction.participants.iter().find(|p| !group.is_member(p)) {
                return Err(SplitMateError::NotGroupMember(outsider.clone()));
            }
        }

        self.storage.save_transaction(transaction.clone()).await?;
        self.link_participants(&transaction, recorded_by).await?;

        self.audit(
            EXPENSE_RECORDED,
            json!({
                "transaction_id": transaction.id,
                "payer": transaction.payer,
                "amount": transaction.amount,
                "currency": transaction.currency,
                "split_type": transaction.split_type.to_string(),
                "group": transaction.group,
            }),
            Some(recorded_by),
        )
        .await?;
        Ok(transaction)
    }

    /// Every pair of participants becomes (or stays) friends.
    async fn link_participants(&self, transaction: &Transaction, recorded_by: &str) -> Result<(), SplitMateError> {
        let participants = &transaction.participants;
        for (i, user_a) in participants.iter().enumerate() {
            for user_b in &participants[i + 1..] {
                let (friendship, created) = self
                    .storage
                    .upsert_friendship(user_a, user_b, transaction.created_at)
                    .await?;
                if created {
                    debug!(user1 = %friendship.user1, user2 = %friendship.user2, "friendship created");
                    self.audit(
                        FRIENDSHIP_CREATED,
                        json!({
                            "friendship_id": friendship.id,
                            "user1": friendship.user1,
                            "user2": friendship.user2,
                            "transaction_id": transaction.id,
                        }),
                        Some(recorded_by),
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }

    /// Newest first.
    pub async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, SplitMateError> {
        self.require_user(user_id).await?;
        let mut transactions = self.storage.fetch_transactions_involving(user_id).await?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(transactions)
    }

    pub async fn transaction_splits(&self, transaction_id: &str, user_id: &str) -> Result<Vec<Split>, SplitMateError> {
        let transaction = self.require_transaction(transaction_id).await?;
        if !transaction.involves(user_id) {
            return Err(SplitMateError::NotTransactionParticipant(user_id.to_string()));
        }
        calculate_splits(&transaction)
    }

    pub async fn settle_transaction(&self, transaction_id: &str, user_id: &str) -> Result<Transaction, SplitMateError> {
        let mut transaction = self.require_transaction(transaction_id).await?;
        if !transaction.involves(user_id) {
            return Err(SplitMateError::NotTransactionParticipant(user_id.to_string()));
        }
        if transaction.is_settled {
            return Err(SplitMateError::TransactionAlreadySettled(transaction_id.to_string()));
        }

        transaction.is_settled = true;
        transaction.settled_at = Some(Utc::now());
        self.storage.save_transaction(transaction.clone()).await?;

        self.audit(
            TRANSACTION_SETTLED,
            json!({ "transaction_id": transaction.id, "settled_at": transaction.settled_at }),
            Some(user_id),
        )
        .await?;
        Ok(transaction)
    }

    pub async fn delete_transaction(&self, transaction_id: &str, user_id: &str) -> Result<(), SplitMateError> {
        let transaction = self.require_transaction(transaction_id).await?;
        if transaction.payer != user_id {
            return Err(SplitMateError::NotTransactionPayer(user_id.to_string()));
        }
        self.storage.delete_transaction(transaction_id).await?;

        self.audit(
            TRANSACTION_DELETED,
            json!({ "transaction_id": transaction_id, "amount": transaction.amount }),
            Some(user_id),
        )
        .await
    }

    // BALANCES

    pub fn balances(&self) -> BalanceEngine<'_, S> {
        BalanceEngine::new(&self.storage)
    }

    pub async fn balance_between(&self, user_id: &str, other_id: &str) -> Result<Decimal, SplitMateError> {
        self.balances().balance_between(user_id, other_id).await
    }

    pub async fn balance_breakdown(&self, user_id: &str, other_id: &str) -> Result<BalanceBreakdown, SplitMateError> {
        self.balances().balance_breakdown(user_id, other_id).await
    }

    pub async fn pair_balance(&self, user_id: &str, other_id: &str) -> Result<PairBalance, SplitMateError> {
        let engine = self.balances();
        let balance = engine.balance_between(user_id, other_id).await?;
        let breakdown = engine.balance_breakdown(user_id, other_id).await?;
        Ok(PairBalance {
            counterparty: other_id.to_string(),
            balance,
            breakdown: breakdown_entries(&breakdown),
        })
    }

    pub async fn all_balances(&self, user_id: &str) -> Result<Vec<CounterpartyBalance>, SplitMateError> {
        self.balances().all_balances(user_id).await
    }

    // FRIENDS

    pub async fn get_friends(&self, user_id: &str) -> Result<FriendsOverview, SplitMateError> {
        self.require_user(user_id).await?;
        let friendships = self.storage.get_friendships(user_id).await?;
        let lookups = friendships
            .iter()
            .map(|friendship| self.friend_balance(user_id, friendship.other(user_id)));
        let friends = futures::future::try_join_all(lookups).await?;

        let overall_balance = friends.iter().try_fold(OverallBalance::default(), |mut acc, friend| {
            if friend.balance > Decimal::ZERO {
                acc.owed = add_amounts(acc.owed, friend.balance)?;
            } else {
                acc.owe = add_amounts(acc.owe, friend.balance.abs())?;
            }
            Ok::<_, SplitMateError>(acc)
        })?;

        Ok(FriendsOverview {
            friends,
            overall_balance,
        })
    }

    async fn friend_balance(&self, user_id: &str, friend_id: &str) -> Result<FriendBalance, SplitMateError> {
        let friend = self.require_user(friend_id).await?;
        let engine = self.balances();
        let balance = engine.balance_between(user_id, friend_id).await?;
        let breakdown: BalanceBreakdown = engine
            .balance_breakdown(user_id, friend_id)
            .await?
            .into_iter()
            .map(|(group, amount)| (group, round_money(amount)))
            .collect();

        Ok(FriendBalance {
            avatar: friend.initials(),
            id: friend.id,
            name: friend.name,
            email: friend.email,
            balance: round_money(balance),
            currency: friend.currency,
            breakdown: breakdown_entries(&breakdown),
        })
    }

    pub async fn search_users(&self, user_id: &str, query: &str) -> Result<Vec<UserSearchResult>, SplitMateError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Ok(Vec::new());
        }

        let users = self.storage.search_users(query, user_id).await?;
        let mut results = Vec::with_capacity(users.len());
        for user in users {
            let is_friend = self.storage.get_friendship(user_id, &user.id).await?.is_some();
            results.push(UserSearchResult {
                id: user.id,
                name: user.name,
                email: user.email,
                is_friend,
            });
        }
        Ok(results)
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, SplitMateError> {
        self.logging.get_logs().await
    }
}

/// Trims and strips angle brackets.
fn sanitize_name(name: &str) -> String {
    name.trim().replace(['<', '>'], "")
}

/// Lower-cases and trims, then checks the `local@domain.tld` shape.
fn normalize_email(email: &str) -> Result<String, SplitMateError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(SplitMateError::MissingEmail);
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            let tld = domain.rsplit('.').next().unwrap_or_default();
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && domain.split('.').all(|label| !label.is_empty())
                && tld.len() >= 2
                && tld.chars().all(|c| c.is_ascii_alphabetic())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(SplitMateError::InvalidEmail(email));
    }
    Ok(email)
}
