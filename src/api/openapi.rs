use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{
        ChangePasswordRequest, CreateGroupRequest, ErrorResponse, LoginRequest, MessageResponse, RecordExpenseRequest,
        SendVerificationRequest, SignupRequest, UpdateProfileRequest, VerifyEmailRequest,
    },
    core::{
        models::{
            balance::{BreakdownEntry, CounterpartyBalance, FriendBalance, FriendsOverview, OverallBalance, PairBalance, Split},
            group::Group,
            transaction::{Category, SplitType, Transaction},
            user::User,
        },
        services::{AuthSession, UserSearchResult},
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health,
        super::handlers::signup,
        super::handlers::login,
        super::handlers::send_verification,
        super::handlers::verify_email,
        super::handlers::get_me,
        super::handlers::update_profile,
        super::handlers::change_password,
        super::handlers::list_groups,
        super::handlers::create_group,
        super::handlers::list_expenses,
        super::handlers::record_expense,
        super::handlers::get_expense_splits,
        super::handlers::settle_expense,
        super::handlers::delete_expense,
        super::handlers::get_friends,
        super::handlers::search_users,
        super::handlers::get_friend_balance,
        super::handlers::get_all_balances
    ),
    components(schemas(
        SignupRequest,
        LoginRequest,
        SendVerificationRequest,
        VerifyEmailRequest,
        UpdateProfileRequest,
        ChangePasswordRequest,
        CreateGroupRequest,
        RecordExpenseRequest,
        MessageResponse,
        ErrorResponse,
        AuthSession,
        UserSearchResult,
        User,
        Group,
        Transaction,
        SplitType,
        Category,
        Split,
        CounterpartyBalance,
        BreakdownEntry,
        PairBalance,
        FriendBalance,
        OverallBalance,
        FriendsOverview
    )),
    modifiers(&BearerAuth),
    info(
        title = "SplitMate API",
        description = "API for shared expenses, friends and pairwise balances",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
