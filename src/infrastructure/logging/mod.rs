pub mod in_memory;

use crate::core::errors::SplitMateError;
use crate::core::models::audit::AppLog;
use async_trait::async_trait;

/// Audit trail of state-changing operations.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SplitMateError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, SplitMateError>;
}
