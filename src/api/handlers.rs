use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::SplitMateError,
        models::{
            balance::{CounterpartyBalance, FriendsOverview, PairBalance, Split},
            group::Group,
            transaction::Transaction,
            user::User,
        },
        services::{AuthSession, SplitMateService, UserSearchResult},
    },
    infrastructure::{
        cache::in_memory::InMemoryCodeCache, logging::in_memory::InMemoryLogging, mailer::in_memory::InMemoryMailer,
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use http::header;
use serde_json::{Value, json};

use std::sync::Arc;

pub type AppService = SplitMateService<InMemoryLogging, InMemoryStorage, InMemoryCodeCache, InMemoryMailer>;
type SharedService = Arc<AppService>;

// Middleware to validate JWT
async fn auth_middleware(
    State(service): State<SharedService>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| SplitMateError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| SplitMateError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// Define API routes
pub fn api_routes(service: SharedService) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/profile", put(update_profile))
        .route("/auth/change-password", put(change_password))
        .route("/groups", get(list_groups).post(create_group))
        .route("/expenses", get(list_expenses).post(record_expense))
        .route("/expenses/{transaction_id}", axum::routing::delete(delete_expense))
        .route("/expenses/{transaction_id}/splits", get(get_expense_splits))
        .route("/expenses/{transaction_id}/settle", post(settle_expense))
        .route("/friends", get(get_friends))
        .route("/friends/search", get(search_users))
        .route("/friends/{friend_id}/balance", get(get_friend_balance))
        .route("/balances", get(get_all_balances))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/send-verification", post(send_verification))
        .route("/auth/verify-email", post(verify_email))
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up"))
)]
async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now() }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthSession),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn signup(
    State(service): State<SharedService>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let session = service.signup(req.into()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthSession),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn login(
    State(service): State<SharedService>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    let session = service.login(&req.email, &req.password).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/send-verification",
    request_body = SendVerificationRequest,
    responses(
        (status = 200, description = "Verification code sent", body = MessageResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already verified", body = ErrorResponse)
    )
)]
async fn send_verification(
    State(service): State<SharedService>,
    Json(req): Json<SendVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    service.send_verification_code(&req.email).await?;
    Ok(Json(MessageResponse::new("Verification code sent to your email")))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = User),
        (status = 400, description = "Missing, expired or wrong code", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already verified", body = ErrorResponse)
    )
)]
async fn verify_email(
    State(service): State<SharedService>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<User>, ApiError> {
    let user = service.verify_email(&req.email, &req.code).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_me(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    let user = service.get_me(&claims.sub).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_profile(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let user = service.update_profile(&claims.sub, req.into()).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password too short", body = ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn change_password(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    service
        .change_password(&claims.sub, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "Groups the user belongs to", body = Vec<Group>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_groups(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let groups = service.list_groups(&claims.sub).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_group(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = service
        .create_group(req.name, req.description, req.member_ids, &claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "Transactions involving the user, newest first", body = Vec<Transaction>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_expenses(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let transactions = service.list_transactions(&claims.sub).await?;
    Ok(Json(transactions))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = RecordExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = Transaction),
        (status = 400, description = "Invalid amount, participants or split", body = ErrorResponse),
        (status = 403, description = "Recorder or participant not allowed", body = ErrorResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn record_expense(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RecordExpenseRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let transaction = service.record_expense(req.into(), &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{transaction_id}/splits",
    params(
        ("transaction_id" = String, Path, description = "ID of the transaction")
    ),
    responses(
        (status = 200, description = "Per-participant splits", body = Vec<Split>),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_expense_splits(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Vec<Split>>, ApiError> {
    let splits = service.transaction_splits(&transaction_id, &claims.sub).await?;
    Ok(Json(splits))
}

#[utoipa::path(
    post,
    path = "/api/expenses/{transaction_id}/settle",
    params(
        ("transaction_id" = String, Path, description = "ID of the transaction")
    ),
    responses(
        (status = 200, description = "Transaction settled", body = Transaction),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 409, description = "Already settled", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn settle_expense(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    let transaction = service.settle_transaction(&transaction_id, &claims.sub).await?;
    Ok(Json(transaction))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{transaction_id}",
    params(
        ("transaction_id" = String, Path, description = "ID of the transaction")
    ),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 403, description = "Only the payer can delete", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_expense(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Path(transaction_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_transaction(&transaction_id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/friends",
    responses(
        (status = 200, description = "Friends with balances and overall summary", body = FriendsOverview),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_friends(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FriendsOverview>, ApiError> {
    let overview = service.get_friends(&claims.sub).await?;
    Ok(Json(overview))
}

#[utoipa::path(
    get,
    path = "/api/friends/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserSearchResult>)
    ),
    security(("Bearer" = []))
)]
async fn search_users(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UserSearchResult>>, ApiError> {
    let users = service.search_users(&claims.sub, &params.query).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/friends/{friend_id}/balance",
    params(
        ("friend_id" = String, Path, description = "ID of the other user")
    ),
    responses(
        (status = 200, description = "Net balance and per-group breakdown", body = PairBalance),
        (status = 400, description = "Balance with oneself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_friend_balance(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
    Path(friend_id): Path<String>,
) -> Result<Json<PairBalance>, ApiError> {
    let balance = service.pair_balance(&claims.sub, &friend_id).await?;
    Ok(Json(balance))
}

#[utoipa::path(
    get,
    path = "/api/balances",
    responses(
        (status = 200, description = "Net balance with every counterparty", body = Vec<CounterpartyBalance>),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_all_balances(
    State(service): State<SharedService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<CounterpartyBalance>>, ApiError> {
    let balances = service.all_balances(&claims.sub).await?;
    Ok(Json(balances))
}
