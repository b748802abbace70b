//! Fake collaborators for exercising the pipelines without a model server.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    context::RagContext,
    error::AppError,
    storage::index::MemoryVectorIndex,
    utils::{
        embedding::{EmbeddingProvider, HashedEmbedder},
        llm::AnswerGenerator,
    },
};

/// Hashed embeddings unless a vector was pinned for the exact text. Counts calls.
pub struct FakeEmbedder {
    fallback: HashedEmbedder,
    pinned: HashMap<String, Vec<f32>>,
    fail_from_call: Option<usize>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            fallback: HashedEmbedder::new(dimension),
            pinned: HashMap::new(),
            fail_from_call: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn pin(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.pinned.insert(text.to_string(), vector);
        self
    }

    /// The `call`-th embed (1-based) and every later one fail as a provider error.
    #[must_use]
    pub fn fail_from_call(mut self, call: usize) -> Self {
        self.fail_from_call = Some(call);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn seen(&self) -> Vec<String> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn backend_label(&self) -> &'static str {
        "fake"
    }

    fn dimension(&self) -> Option<usize> {
        self.fallback.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().await.push(text.to_string());
        if self.fail_from_call.is_some_and(|from| call >= from) {
            return Err(AppError::Provider(format!("embedding call {call} failed")));
        }
        match self.pinned.get(text) {
            Some(vector) => Ok(vector.clone()),
            None => self.fallback.embed(text).await,
        }
    }
}

/// Always fails, as an unreachable provider would.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn backend_label(&self) -> &'static str {
        "failing"
    }

    fn dimension(&self) -> Option<usize> {
        None
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
        Err(AppError::Provider("embedding backend unavailable".into()))
    }
}

/// Answers every prompt with a fixed reply and records what it was asked.
pub struct FakeGenerator {
    reply: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl AnswerGenerator for FakeGenerator {
    async fn chat(&self, prompt: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn chat(&self, _prompt: &str) -> Result<String, AppError> {
        Err(AppError::Provider("model backend unavailable".into()))
    }
}

/// Handles to the fakes behind a [`RagContext`] so tests can inspect them.
pub struct FakeHarness {
    pub ctx: RagContext,
    pub embedder: Arc<FakeEmbedder>,
    pub generator: Arc<FakeGenerator>,
    pub index: Arc<MemoryVectorIndex>,
}

impl FakeHarness {
    pub fn new(embedder: FakeEmbedder, reply: &str) -> Self {
        let embedder = Arc::new(embedder);
        let generator = Arc::new(FakeGenerator::new(reply));
        let index = Arc::new(MemoryVectorIndex::new());
        let ctx = RagContext::new(
            Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
            Arc::clone(&index) as Arc<dyn crate::storage::index::VectorIndex>,
            Arc::clone(&generator) as Arc<dyn AnswerGenerator>,
        );
        Self {
            ctx,
            embedder,
            generator,
            index,
        }
    }
}
