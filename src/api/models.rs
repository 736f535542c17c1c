use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::SplitMateError;
use crate::core::models::transaction::{Category, SplitType};
use crate::core::services::{NewExpense, ProfileUpdate, SignupInput};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub currency: Option<String>,
}

impl From<SignupRequest> for SignupInput {
    fn from(req: SignupRequest) -> Self {
        SignupInput {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
            currency: req.currency,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SendVerificationRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub currency: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            name: req.name,
            phone: req.phone,
            currency: req.currency,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordExpenseRequest {
    pub payer: String,
    pub participants: Vec<String>,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub group: Option<String>,
    #[schema(value_type = Option<String>)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default)]
    #[schema(value_type = BTreeMap<String, f64>)]
    pub custom_splits: BTreeMap<String, Decimal>,
    pub notes: Option<String>,
}

impl From<RecordExpenseRequest> for NewExpense {
    fn from(req: RecordExpenseRequest) -> Self {
        NewExpense {
            payer: req.payer,
            participants: req.participants,
            amount: req.amount,
            currency: req.currency,
            description: req.description,
            category: req.category,
            group: req.group,
            date: req.date,
            split_type: req.split_type,
            custom_splits: req.custom_splits,
            notes: req.notes,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct SearchQuery {
    /// At least two characters; shorter queries return no matches.
    pub query: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse { message: message.into() }
    }
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for SplitMateError to implement IntoResponse
pub struct ApiError(pub SplitMateError);

impl From<SplitMateError> for ApiError {
    fn from(err: SplitMateError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SplitMateError::MissingEmail
            | SplitMateError::InvalidEmail(_)
            | SplitMateError::NonPositiveAmount(_)
            | SplitMateError::EmptyParticipants
            | SplitMateError::PayerNotParticipant(_)
            | SplitMateError::DuplicateParticipant(_)
            | SplitMateError::InvalidSplit(_)
            | SplitMateError::AmountOverflow(_)
            | SplitMateError::SelfBalance(_)
            | SplitMateError::VerificationCodeNotFound(_)
            | SplitMateError::VerificationCodeExpired(_)
            | SplitMateError::InvalidVerificationCode
            | SplitMateError::InvalidInput(_, _) => StatusCode::BAD_REQUEST,
            SplitMateError::InvalidCredentials | SplitMateError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SplitMateError::NotGroupMember(_)
            | SplitMateError::NotTransactionParticipant(_)
            | SplitMateError::NotTransactionPayer(_) => StatusCode::FORBIDDEN,
            SplitMateError::UserNotFound(_)
            | SplitMateError::GroupNotFound(_)
            | SplitMateError::TransactionNotFound(_) => StatusCode::NOT_FOUND,
            SplitMateError::EmailAlreadyRegistered(_)
            | SplitMateError::TransactionAlreadySettled(_)
            | SplitMateError::EmailAlreadyVerified(_) => StatusCode::CONFLICT,
            SplitMateError::InternalServerError(_) | SplitMateError::LoggingError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match &self.0 {
            SplitMateError::InvalidCredentials => "Invalid email or password".to_string(),
            SplitMateError::InvalidInput(_, field_error) => {
                format!("{}: {}", field_error.title, field_error.description)
            }
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
