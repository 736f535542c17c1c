pub mod in_memory;

use crate::core::errors::SplitMateError;
use async_trait::async_trait;

/// Outgoing mail. Real delivery (SMTP, provider APIs) lives behind this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), SplitMateError>;
}
