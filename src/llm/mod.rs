//! Language-model client
//!
//! [`ReplyGenerator`] turns one utterance into one reply. It never fails:
//! transient errors are retried with backoff, and anything that still goes
//! wrong is answered from the local fallback table with `degraded` set.
//! After a failure the generator stays offline for a cooldown period and
//! serves fallback replies without touching the network.

pub mod fallback;
pub mod gemini;
pub mod prompt;
pub mod retry;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub use fallback::{FallbackCategory, OFFLINE_NOTICE, fallback_reply};
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;

use crate::Result;
use crate::config::{Config, LlmConfig, clone_secret};

/// Prompt used by [`ReplyGenerator::test_connection`]
const PROBE_PROMPT: &str = "Test koneksi - jawab singkat: OK";

/// A reply to one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply text
    pub text: String,

    /// Whether this came from the local fallback table instead of the model
    pub degraded: bool,
}

/// Anything that can answer a user utterance
///
/// The session controller depends on this seam rather than on a concrete
/// model so it can run against the knowledge store or scripted sources.
#[async_trait]
pub trait ReplySource: Send + Sync {
    /// Answer `utterance`, given the session context block
    ///
    /// # Errors
    ///
    /// Returns error if no reply could be produced at all
    async fn reply(&self, utterance: &str, context: &str) -> Result<Reply>;
}

/// Failure from a single model call
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Network failure, timeout or overloaded server; worth retrying
    #[error("transient failure: {0}")]
    Transient(String),

    /// The API key was rejected
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Quota or rate limit exhausted
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// The prompt or reply was blocked by content policy
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Whether another attempt might succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether the failure says the service is unusable right now
    ///
    /// Content-policy rejections are about the prompt, not the service.
    #[must_use]
    pub const fn marks_offline(&self) -> bool {
        !matches!(self, Self::ContentBlocked(_))
    }
}

/// A text-generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ModelError>;
}

/// Online/offline state as seen by callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub online: bool,
    pub last_check: Option<DateTime<Utc>>,
}

/// Outcome of an explicit connection probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
}

#[derive(Debug)]
struct ConnectionState {
    online: bool,
    last_check: Option<Instant>,
    last_check_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    fn record(&mut self, online: bool) {
        self.online = online;
        self.last_check = Some(Instant::now());
        self.last_check_at = Some(Utc::now());
    }
}

/// Reply generator with retry, cooldown and local fallback
pub struct ReplyGenerator {
    model: Option<Arc<dyn LanguageModel>>,
    policy: RetryPolicy,
    offline_cooldown: Duration,
    state: Mutex<ConnectionState>,
}

impl ReplyGenerator {
    /// Create a generator over `model`
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, config: &LlmConfig) -> Self {
        Self::build(Some(model), config)
    }

    /// Create a generator with no model; every reply comes from the fallback table
    #[must_use]
    pub fn offline(config: &LlmConfig) -> Self {
        Self::build(None, config)
    }

    /// Create a Gemini-backed generator from configuration
    ///
    /// Without a Gemini key the generator runs offline.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        match &config.api_keys.gemini {
            Some(key) => {
                let client = GeminiClient::new(clone_secret(key), config.llm.model.clone());
                Self::new(Arc::new(client), &config.llm)
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set, replies will come from the fallback table");
                Self::offline(&config.llm)
            }
        }
    }

    fn build(model: Option<Arc<dyn LanguageModel>>, config: &LlmConfig) -> Self {
        Self {
            model,
            policy: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay,
                ..RetryPolicy::default()
            },
            offline_cooldown: config.offline_cooldown,
            state: Mutex::new(ConnectionState {
                online: true,
                last_check: None,
                last_check_at: None,
            }),
        }
    }

    /// Produce a reply for `utterance`
    ///
    /// Never fails. A reply that did not come from the model has
    /// `degraded` set.
    pub async fn generate_reply(&self, utterance: &str, context: &str) -> Reply {
        let Some(model) = &self.model else {
            return Self::degraded(utterance, false);
        };

        if !self.should_attempt() {
            tracing::debug!("model offline, serving fallback reply");
            return Self::degraded(utterance, false);
        }

        let prompt = prompt::build_prompt(utterance, context);
        let mut attempt = 0;

        loop {
            match model.generate(&prompt).await {
                Ok(text) => {
                    self.record(true);
                    tracing::info!(attempt, reply_chars = text.chars().count(), "model reply received");
                    return Reply {
                        text,
                        degraded: false,
                    };
                }
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = retry::delay_for_attempt(&self.policy, attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "model call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "model call failed, using fallback reply");
                    if e.marks_offline() {
                        self.record(false);
                    }
                    return Self::degraded(utterance, true);
                }
            }
        }
    }

    /// Current connection state
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        let state = self.lock();
        ConnectionStatus {
            online: state.online,
            last_check: state.last_check_at,
        }
    }

    /// Forget past failures so the next reply calls the model again
    pub fn reset_connection(&self) {
        let mut state = self.lock();
        state.online = true;
        state.last_check = None;
        state.last_check_at = None;
        tracing::info!("connection status reset");
    }

    /// Probe the model with a trivial prompt, bypassing the cooldown
    pub async fn test_connection(&self) -> ConnectionTest {
        let Some(model) = &self.model else {
            return ConnectionTest {
                success: false,
                message: "Tidak ada API key Gemini yang dikonfigurasi".to_string(),
            };
        };

        match model.generate(PROBE_PROMPT).await {
            Ok(_) => {
                self.record(true);
                ConnectionTest {
                    success: true,
                    message: "Koneksi ke Gemini AI berhasil".to_string(),
                }
            }
            Err(e) => {
                self.record(false);
                ConnectionTest {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }

    fn should_attempt(&self) -> bool {
        let state = self.lock();
        state.online
            || state
                .last_check
                .is_none_or(|at| at.elapsed() > self.offline_cooldown)
    }

    fn record(&self, online: bool) {
        self.lock().record(online);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ConnectionState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn degraded(utterance: &str, with_notice: bool) -> Reply {
        Reply {
            text: fallback_reply(utterance, with_notice),
            degraded: true,
        }
    }
}

#[async_trait]
impl ReplySource for ReplyGenerator {
    async fn reply(&self, utterance: &str, context: &str) -> Result<Reply> {
        Ok(self.generate_reply(utterance, context).await)
    }
}
