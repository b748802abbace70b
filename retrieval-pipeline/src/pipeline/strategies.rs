use std::sync::Arc;

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::index::{IndexHit, VectorIndex},
    utils::embedding::{dot_product, EmbeddingProvider},
};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use super::config::{QueryVariant, RetrievalTuning};
use crate::{scoring::ScoreConvention, RetrievalResult, RetrievedChunk};

#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    Found {
        context: String,
        result: RetrievalResult,
    },
    NoRelevantData,
}

impl RetrievalOutcome {
    fn from_context(context: String, result: RetrievalResult) -> Self {
        if context.trim().is_empty() {
            Self::NoRelevantData
        } else {
            Self::Found { context, result }
        }
    }
}

/// Turns a user query into prompt context.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn variant(&self) -> QueryVariant;

    async fn retrieve(&self, query: &str) -> Result<RetrievalOutcome, AppError>;
}

/// Picks the single stored answer whose question scores highest against the
/// query under a raw dot product.
pub struct QaMatchRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    candidate_limit: usize,
    concurrency: usize,
}

impl QaMatchRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        tuning: &RetrievalTuning,
    ) -> Self {
        Self {
            embedder,
            index,
            candidate_limit: tuning.qa_candidate_limit,
            concurrency: tuning.question_embedding_concurrency.max(1),
        }
    }
}

#[async_trait]
impl Retriever for QaMatchRetriever {
    fn variant(&self) -> QueryVariant {
        QueryVariant::Qa
    }

    #[tracing::instrument(skip_all, fields(variant = "qa"))]
    async fn retrieve(&self, query: &str) -> Result<RetrievalOutcome, AppError> {
        let query_vector = self.embedder.embed(query).await?;
        let hits = self.index.query(&query_vector, self.candidate_limit).await?;
        let hit_count = hits.len();

        let candidates: Vec<_> = hits
            .into_iter()
            .map(IndexHit::into_chunk)
            // Only usable pairs compete: a winner must carry an answer to quote.
            .filter(|chunk| chunk.question().is_some() && !chunk.text.trim().is_empty())
            .collect();

        // `buffered` keeps index order, which the tie-break depends on.
        let embedder = &self.embedder;
        let question_embeddings: Vec<_> = candidates
            .iter()
            .map(|chunk| embedder.embed(chunk.question().unwrap_or_default()))
            .collect();
        let question_vectors: Vec<Vec<f32>> = stream::iter(question_embeddings)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let scored: Vec<RetrievedChunk> = candidates
            .into_iter()
            .zip(&question_vectors)
            .map(|(chunk, question_vector)| RetrievedChunk {
                score: dot_product(&query_vector, question_vector),
                chunk,
            })
            .collect();

        let convention = ScoreConvention::Similarity;
        let Some((winner, score)) = convention.best_position(scored.iter().map(|c| c.score))
        else {
            debug!(hit_count, "no stored question to match against");
            return Ok(RetrievalOutcome::NoRelevantData);
        };

        let context = scored[winner].chunk.text.clone();
        debug!(
            hit_count,
            candidate_count = scored.len(),
            winner,
            score,
            "matched stored question"
        );

        Ok(RetrievalOutcome::from_context(
            context,
            RetrievalResult {
                convention,
                hits: scored,
            },
        ))
    }
}

/// Concatenates the text of every retrieved chunk, nearest first.
pub struct DocumentContextRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    limit: Option<usize>,
}

impl DocumentContextRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        tuning: &RetrievalTuning,
    ) -> Self {
        Self {
            embedder,
            index,
            limit: tuning.document_context_limit,
        }
    }
}

#[async_trait]
impl Retriever for DocumentContextRetriever {
    fn variant(&self) -> QueryVariant {
        QueryVariant::Document
    }

    #[tracing::instrument(skip_all, fields(variant = "document", limit = ?self.limit))]
    async fn retrieve(&self, query: &str) -> Result<RetrievalOutcome, AppError> {
        let query_vector = self.embedder.embed(query).await?;
        let hits = match self.limit {
            Some(limit) => self.index.query(&query_vector, limit).await?,
            None => self.index.scan_ranked(&query_vector).await?,
        };

        let hits: Vec<RetrievedChunk> = hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                score: hit.distance,
                chunk: hit.into_chunk(),
            })
            .collect();

        let context = hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            hit_count = hits.len(),
            context_chars = context.chars().count(),
            "assembled document context"
        );

        Ok(RetrievalOutcome::from_context(
            context,
            RetrievalResult {
                convention: ScoreConvention::Distance,
                hits,
            },
        ))
    }
}
