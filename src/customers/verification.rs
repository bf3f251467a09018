// Phone verification
//
// One-time codes for phone login. The bundled verifier keeps codes in memory
// and logs them instead of sending an SMS; a provider-backed implementation
// plugs in behind the same trait.

use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::business_rules::RulesResult;

/// Codes expire after 10 minutes
pub const CODE_TTL: Duration = Duration::from_secs(600);

/// Wrong attempts allowed before a code is discarded
pub const MAX_ATTEMPTS: u32 = 5;

#[async_trait]
pub trait PhoneVerifier: Send + Sync {
    async fn send_code(&self, phone: &str) -> RulesResult<()>;

    /// Whether `code` matches the last code sent to `phone`; a matching code
    /// is consumed
    async fn check_code(&self, phone: &str, code: &str) -> RulesResult<bool>;
}

#[derive(Debug)]
struct PendingCode {
    code_hash: String,
    expires_at: Instant,
    attempts: u32,
}

/// In-memory verifier storing SHA-256 digests of the issued codes
#[derive(Debug)]
pub struct InMemoryPhoneVerifier {
    pending: Mutex<HashMap<String, PendingCode>>,
    ttl: Duration,
}

impl Default for InMemoryPhoneVerifier {
    fn default() -> Self {
        Self::with_ttl(CODE_TTL)
    }
}

impl InMemoryPhoneVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Hash a code together with its phone number
    fn hash_code(phone: &str, code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(phone.as_bytes());
        hasher.update(b":");
        hasher.update(code.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn generate_code() -> String {
        let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{:06}", code)
    }

    /// Issue a fresh code for `phone`, replacing any previous one
    ///
    /// Expired codes of every phone are dropped on the way, so numbers that
    /// never verify do not accumulate.
    pub async fn issue_code(&self, phone: &str) -> String {
        let code = Self::generate_code();
        let now = Instant::now();
        let entry = PendingCode {
            code_hash: Self::hash_code(phone, &code),
            expires_at: now + self.ttl,
            attempts: 0,
        };

        let mut pending = self.pending.lock().await;
        pending.retain(|_, code| code.expires_at > now);
        pending.insert(phone.to_string(), entry);
        code
    }

    #[cfg(test)]
    async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[async_trait]
impl PhoneVerifier for InMemoryPhoneVerifier {
    async fn send_code(&self, phone: &str) -> RulesResult<()> {
        let code = self.issue_code(phone).await;
        tracing::debug!("Verification code for {}: {}", phone, code);
        tracing::info!("Verification code sent to {}", phone);
        Ok(())
    }

    async fn check_code(&self, phone: &str, code: &str) -> RulesResult<bool> {
        let mut pending = self.pending.lock().await;
        let Some(entry) = pending.get_mut(phone) else {
            return Ok(false);
        };

        if entry.expires_at <= Instant::now() {
            pending.remove(phone);
            return Ok(false);
        }

        if entry.code_hash == Self::hash_code(phone, code.trim()) {
            pending.remove(phone);
            return Ok(true);
        }

        entry.attempts += 1;
        if entry.attempts >= MAX_ATTEMPTS {
            tracing::warn!("Too many wrong codes for {}, code discarded", phone);
            pending.remove(phone);
        }
        Ok(false)
    }
}
