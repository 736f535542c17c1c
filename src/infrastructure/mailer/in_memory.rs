use crate::core::errors::SplitMateError;
use crate::infrastructure::mailer::Mailer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Clone, Debug)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub code: String,
    pub sent_at: DateTime<Utc>,
}

/// Keeps an outbox instead of delivering; used for local runs and tests.
#[derive(Clone, Default)]
pub struct InMemoryMailer {
    outbox: Arc<RwLock<Vec<SentMail>>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn outbox(&self) -> Vec<SentMail> {
        self.outbox.read().await.clone()
    }

    pub async fn last_code_for(&self, email: &str) -> Option<String> {
        let outbox = self.outbox.read().await;
        outbox.iter().rev().find(|m| m.to == email).map(|m| m.code.clone())
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), SplitMateError> {
        info!(to = email, "queued verification email");
        let mut outbox = self.outbox.write().await;
        outbox.push(SentMail {
            to: email.to_string(),
            subject: "SplitMate - Email Verification Code".to_string(),
            code: code.to_string(),
            sent_at: Utc::now(),
        });
        Ok(())
    }
}
