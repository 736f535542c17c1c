pub mod in_memory;
pub mod sweeper;

use crate::constants::VERIFICATION_CODE_DIGITS;
use crate::core::errors::SplitMateError;
use async_trait::async_trait;
use uuid::Uuid;

/// Short-lived email verification codes keyed by email.
#[async_trait]
pub trait CodeCache: Send + Sync {
    /// Stores `code` for `email`, replacing any previous code and its expiry.
    async fn store_code(&self, email: &str, code: &str) -> Result<(), SplitMateError>;
    /// Consumes the code when it matches and has not expired.
    async fn verify_code(&self, email: &str, code: &str) -> Result<(), SplitMateError>;
    /// Drops every expired entry, returning how many were removed.
    async fn sweep_expired(&self) -> Result<usize, SplitMateError>;
    async fn len(&self) -> Result<usize, SplitMateError>;
}

/// Zero-padded numeric code, e.g. "042917".
pub fn generate_code() -> String {
    let modulus = 10u128.pow(VERIFICATION_CODE_DIGITS);
    format!(
        "{:0width$}",
        Uuid::new_v4().as_u128() % modulus,
        width = VERIFICATION_CODE_DIGITS as usize
    )
}
