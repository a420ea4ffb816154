mod cache;
mod sniff;

pub use cache::{CachedSecret, SecretCache};
pub use sniff::ChromiumSniffer;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::signing;

/// Raw HMAC key material captured from the tracker page.
#[derive(Debug, Clone)]
pub struct SigningSecret {
    value: String,
    /// Epoch millis at capture (or cache adoption) time.
    acquired_at: u64,
}

impl SigningSecret {
    pub fn new(value: impl Into<String>, acquired_at: u64) -> Self {
        Self {
            value: value.into(),
            acquired_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    pub fn acquired_at(&self) -> u64 {
        self.acquired_at
    }

    pub fn age(&self, now_millis: u64) -> Duration {
        Duration::from_millis(now_millis.saturating_sub(self.acquired_at))
    }
}

/// Produces fresh signing-key material. Implemented by the headless-browser
/// sniffer in production and by scripted fakes in tests.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn extract(&self) -> Result<SigningSecret>;
}

/// Owns the one live signing secret: memory first, then the disk cache, then
/// a fresh extraction. The request executor drives invalidation on auth
/// failures; nothing else mutates the secret.
pub struct SecretManager {
    source: Box<dyn SecretSource>,
    cache: SecretCache,
    ttl: Duration,
    current: Mutex<Option<SigningSecret>>,
}

impl SecretManager {
    pub fn new(source: Box<dyn SecretSource>, cache: SecretCache, ttl: Duration) -> Self {
        Self {
            source,
            cache,
            ttl,
            current: Mutex::new(None),
        }
    }

    /// Returns a usable signing secret, extracting one if neither the
    /// in-memory copy nor the disk cache holds a fresh value. The lock is
    /// held across the whole sequence so concurrent callers cannot race a
    /// second browser launch.
    pub async fn ensure(&self) -> Result<SigningSecret> {
        let mut current = self.current.lock().await;
        let now = signing::epoch_millis()?;

        if let Some(secret) = current.as_ref() {
            if secret.age(now) < self.ttl {
                return Ok(secret.clone());
            }
            debug!("in-memory signing secret expired");
            *current = None;
        }

        if let Some(record) = self.cache.load().await {
            let secret = SigningSecret::new(record.secret, record.timestamp);
            if secret.value.is_empty() {
                debug!("ignoring empty cached signing secret");
            } else if secret.age(now) < self.ttl {
                debug!("adopted signing secret from disk cache");
                *current = Some(secret.clone());
                return Ok(secret);
            } else {
                debug!("cached signing secret expired");
            }
        }

        info!("extracting fresh signing secret");
        let secret = self.source.extract().await?;
        let record = CachedSecret {
            secret: secret.value.clone(),
            timestamp: secret.acquired_at,
        };
        if let Err(e) = self.cache.store(&record).await {
            warn!(error = %e, "failed to persist signing secret");
        }
        *current = Some(secret.clone());
        Ok(secret)
    }

    /// Drops the in-memory secret and deletes the persisted record.
    /// Idempotent; safe to call when nothing is cached.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        *current = None;
        if let Err(e) = self.cache.clear().await {
            warn!(error = %e, "failed to delete cached signing secret");
        }
        debug!("signing secret invalidated");
    }
}
