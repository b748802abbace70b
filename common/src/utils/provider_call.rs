use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::timeout;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::warn;

use super::{embedding::EmbeddingProvider, llm::AnswerGenerator};
use crate::error::AppError;

/// Deadline and retry budget applied to every embedding and generation call.
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: usize,
    pub backoff_factor_ms: u64,
    pub max_backoff: Duration,
}

impl CallPolicy {
    pub const fn new(timeout: Duration, max_retries: usize) -> Self {
        Self {
            timeout,
            max_retries,
            backoff_factor_ms: 50,
            max_backoff: Duration::from_secs(5),
        }
    }

    fn backoff(&self) -> impl Iterator<Item = Duration> {
        // 100ms, 200ms, 400ms, ... capped, with jitter
        ExponentialBackoff::from_millis(2)
            .factor(self.backoff_factor_ms)
            .max_delay(self.max_backoff)
            .map(jitter)
            .take(self.max_retries)
    }
}

/// Runs `call` under the policy's deadline, retrying provider failures with
/// exponential backoff. Any other error is returned immediately.
pub async fn guarded_call<T, F, Fut>(
    policy: &CallPolicy,
    operation: &'static str,
    mut call: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let limit = policy.timeout;
    RetryIf::spawn(
        policy.backoff(),
        || {
            let attempt = call();
            async move {
                timeout(limit, attempt)
                    .await
                    .unwrap_or_else(|_| Err(AppError::ProviderTimeout(limit)))
            }
        },
        |err: &AppError| {
            let retryable = err.is_provider_failure();
            if retryable {
                warn!(operation, error = %err, "provider call failed");
            }
            retryable
        },
    )
    .await
}

pub struct GuardedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    policy: CallPolicy,
}

impl GuardedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, policy: CallPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl EmbeddingProvider for GuardedEmbedder {
    fn backend_label(&self) -> &'static str {
        self.inner.backend_label()
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        guarded_call(&self.policy, "embed", || self.inner.embed(text)).await
    }
}

pub struct GuardedGenerator {
    inner: Arc<dyn AnswerGenerator>,
    policy: CallPolicy,
}

impl GuardedGenerator {
    pub fn new(inner: Arc<dyn AnswerGenerator>, policy: CallPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl AnswerGenerator for GuardedGenerator {
    async fn chat(&self, prompt: &str) -> Result<String, AppError> {
        guarded_call(&self.policy, "chat", || self.inner.chat(prompt)).await
    }
}
