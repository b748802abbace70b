use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use tracing::debug;

use crate::error::AppError;

/// Maps text to a dense vector. The dimension is fixed per model.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn backend_label(&self) -> &'static str;

    /// Known up front for local backends; remote models report it with the first vector.
    fn dimension(&self) -> Option<usize>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

/// Embeddings from any OpenAI-compatible endpoint (OpenAI itself, or a local Ollama).
pub struct OpenAiEmbedder {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn backend_label(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> Option<usize> {
        None
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input([text])
            .build()?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::Provider(format!("embedding request failed: {e}")))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Provider("No embedding data received from API".into()))?
            .embedding;

        debug!(
            model = %self.model,
            dimensions = embedding.len(),
            "Embedding was created"
        );

        Ok(embedding)
    }
}

/// Deterministic bag-of-words embedder. Needs no model and no network.
pub struct HashedEmbedder {
    dimension: usize,
}

impl HashedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HashedEmbedder {
    fn backend_label(&self) -> &'static str {
        "hashed"
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(hashed_embedding(text, self.dimension))
    }
}

fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    let mut token_count = 0f32;
    for token in tokens(text) {
        token_count += 1.0;
        let idx = bucket(&token, dim);
        vector[idx] += 1.0;
    }

    if token_count == 0.0 {
        return vector;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimension
}

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashed_embeddings_are_deterministic_and_normalised() {
        let embedder = HashedEmbedder::new(64);
        let a = embedder.embed("What is X?").await.expect("embed");
        let b = embedder.embed("what is x").await.expect("embed");

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        let norm = dot_product(&a, &a).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn hashed_embedding_of_punctuation_is_zero() {
        let embedder = HashedEmbedder::new(8);
        let v = embedder.embed("?!...").await.expect("embed");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn dot_product_is_unnormalised() {
        assert!((dot_product(&[2.0, 0.0], &[3.0, 5.0]) - 6.0).abs() < f32::EPSILON);
        assert!((dot_product(&[1.0, 1.0], &[1.0, 1.0]) - 2.0).abs() < f32::EPSILON);
    }
}
