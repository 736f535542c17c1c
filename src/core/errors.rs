use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum SplitMateError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("User {0} is not a group member")]
    NotGroupMember(String),
    #[error("Transaction {0} not found")]
    TransactionNotFound(String),
    #[error("Transaction {0} already settled")]
    TransactionAlreadySettled(String),
    #[error("User {0} is not a participant of the transaction")]
    NotTransactionParticipant(String),
    #[error("User {0} did not pay for the transaction")]
    NotTransactionPayer(String),
    #[error("Amount must be greater than 0, got {0}")]
    NonPositiveAmount(String),
    #[error("Transaction must have at least one participant")]
    EmptyParticipants,
    #[error("Payer {0} is not among the participants")]
    PayerNotParticipant(String),
    #[error("Participant {0} is listed more than once")]
    DuplicateParticipant(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Amount out of range: {0}")]
    AmountOverflow(String),
    #[error("Cannot compute a balance between user {0} and themselves")]
    SelfBalance(String),
    #[error("No verification code found for {0}")]
    VerificationCodeNotFound(String),
    #[error("Verification code for {0} has expired")]
    VerificationCodeExpired(String),
    #[error("Invalid verification code")]
    InvalidVerificationCode,
    #[error("Email {0} is already verified")]
    EmailAlreadyVerified(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl SplitMateError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        SplitMateError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }

    /// Failures caused by the request rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            SplitMateError::InternalServerError(_) | SplitMateError::LoggingError(_)
        )
    }
}
