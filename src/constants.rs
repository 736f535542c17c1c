pub const NON_GROUP_LABEL: &str = "non-group expenses";

pub const USER_SIGNED_UP: &str = "USER_SIGNED_UP";
pub const USER_LOGGED_IN: &str = "USER_LOGGED_IN";
pub const PROFILE_UPDATED: &str = "PROFILE_UPDATED";
pub const PASSWORD_CHANGED: &str = "PASSWORD_CHANGED";
pub const VERIFICATION_CODE_SENT: &str = "VERIFICATION_CODE_SENT";
pub const EMAIL_VERIFIED: &str = "EMAIL_VERIFIED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const EXPENSE_RECORDED: &str = "EXPENSE_RECORDED";
pub const TRANSACTION_SETTLED: &str = "TRANSACTION_SETTLED";
pub const TRANSACTION_DELETED: &str = "TRANSACTION_DELETED";
pub const FRIENDSHIP_CREATED: &str = "FRIENDSHIP_CREATED";

pub const MIN_SEARCH_QUERY_LEN: usize = 2;
pub const VERIFICATION_CODE_DIGITS: u32 = 6;
