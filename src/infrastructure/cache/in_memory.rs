use crate::core::errors::SplitMateError;
use crate::infrastructure::cache::CodeCache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Debug)]
struct CodeEntry {
    code: String,
    expires_at: Instant,
}

impl CodeEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded code store with lazy expiry; pair with [`super::sweeper::spawn_sweeper`].
#[derive(Clone)]
pub struct InMemoryCodeCache {
    entries: Arc<RwLock<HashMap<String, CodeEntry>>>,
    ttl: Duration,
    capacity: usize,
}

impl InMemoryCodeCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        InMemoryCodeCache {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[async_trait]
impl CodeCache for InMemoryCodeCache {
    async fn store_code(&self, email: &str, code: &str) -> Result<(), SplitMateError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(email) && entries.len() >= self.capacity {
            entries.retain(|_, entry| !entry.is_expired(now));
            if entries.len() >= self.capacity {
                let soonest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(key, _)| key.clone());
                if let Some(key) = soonest {
                    debug!(email = %key, "evicting verification code at capacity");
                    entries.remove(&key);
                }
            }
        }

        entries.insert(
            email.to_string(),
            CodeEntry {
                code: code.to_string(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<(), SplitMateError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let entry = entries
            .get(email)
            .ok_or_else(|| SplitMateError::VerificationCodeNotFound(email.to_string()))?;

        if entry.is_expired(now) {
            entries.remove(email);
            return Err(SplitMateError::VerificationCodeExpired(email.to_string()));
        }
        if entry.code != code {
            return Err(SplitMateError::InvalidVerificationCode);
        }
        entries.remove(email);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize, SplitMateError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    async fn len(&self) -> Result<usize, SplitMateError> {
        Ok(self.entries.read().await.len())
    }
}
