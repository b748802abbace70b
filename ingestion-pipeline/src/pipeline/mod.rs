mod config;

pub use config::{IngestionConfig, IngestionTuning};

use std::{collections::HashSet, sync::Arc, time::Instant};

use common::{
    context::RagContext,
    error::AppError,
    storage::{
        index::store_chunk,
        types::{
            chunk::{FILENAME_KEY, QUESTION_KEY},
            Chunk, SourceType,
        },
    },
};
use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::utils::{
    chunking::Chunker,
    file_text_extraction::{DefaultFileDecoder, FileDecoder},
    qa_payload::parse_qa_payload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Distinct chunks written to the index.
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QaIngestReport {
    pub stored_count: usize,
    pub skipped_count: usize,
}

#[allow(clippy::module_name_repetitions)]
pub struct IngestionPipeline {
    ctx: RagContext,
    pipeline_config: IngestionConfig,
    decoder: Arc<dyn FileDecoder>,
    chunker: Chunker,
}

impl IngestionPipeline {
    pub fn new(ctx: RagContext, pipeline_config: IngestionConfig) -> Result<Self, AppError> {
        Self::with_decoder(ctx, pipeline_config, Arc::new(DefaultFileDecoder))
    }

    pub fn with_decoder(
        ctx: RagContext,
        pipeline_config: IngestionConfig,
        decoder: Arc<dyn FileDecoder>,
    ) -> Result<Self, AppError> {
        let tuning = &pipeline_config.tuning;
        let chunker = Chunker::new(tuning.chunk_size, tuning.chunk_overlap)?;
        Ok(Self {
            ctx,
            pipeline_config,
            decoder,
            chunker,
        })
    }

    /// Decodes an uploaded file, splits it into chunks and stores each distinct
    /// chunk under its content hash. Re-ingesting the same file overwrites the
    /// existing entries.
    #[tracing::instrument(
        skip_all,
        fields(filename = %filename, byte_len = bytes.len(), mime = mime_hint.unwrap_or("unknown"))
    )]
    pub async fn ingest_document(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_hint: Option<&str>,
    ) -> Result<IngestReport, AppError> {
        let started = Instant::now();
        let text = self.decoder.extract_text(bytes, filename).await?;
        let pieces = self.chunker.split(&text);
        let piece_count = pieces.len();

        let chunks = distinct_chunks(pieces.into_iter().map(|piece| {
            Chunk::new(piece, SourceType::Document).with_metadata(FILENAME_KEY, filename)
        }));
        let chunk_count = self.embed_and_store(&chunks).await?;

        info!(
            text_chars = text.chars().count(),
            piece_count,
            chunk_count,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "document ingested"
        );
        Ok(IngestReport { chunk_count })
    }

    /// Stores every complete question/answer pair. The answer is what gets
    /// embedded; the question travels along as metadata.
    #[tracing::instrument(skip_all, fields(byte_len = raw.len()))]
    pub async fn ingest_qa_pairs(&self, raw: &[u8]) -> Result<QaIngestReport, AppError> {
        let payload = parse_qa_payload(raw)?;

        let chunks = distinct_chunks(payload.entries.into_iter().map(|entry| {
            debug!(question = %entry.question, "queued QA pair");
            Chunk::new(entry.answer, SourceType::Qa).with_metadata(QUESTION_KEY, entry.question)
        }));
        let stored_count = self.embed_and_store(&chunks).await?;

        info!(
            stored_count,
            skipped_count = payload.skipped,
            "QA pairs ingested"
        );
        Ok(QaIngestReport {
            stored_count,
            skipped_count: payload.skipped,
        })
    }

    /// Embeds every chunk before the first write, so a provider failure
    /// leaves the index untouched.
    async fn embed_and_store(&self, chunks: &[Chunk]) -> Result<usize, AppError> {
        let concurrency = self.pipeline_config.tuning.embedding_concurrency.max(1);
        let embedder = &self.ctx.embedder;

        let chunk_embeddings: Vec<_> = chunks
            .iter()
            .map(|chunk| embedder.embed(&chunk.text))
            .collect();
        let embeddings = stream::iter(chunk_embeddings)
            .buffered(concurrency)
            .try_collect::<Vec<Vec<f32>>>()
            .await?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            store_chunk(self.ctx.index.as_ref(), chunk, embedding).await?;
        }

        Ok(chunks.len())
    }
}

/// Drops blank chunks and repeats of an earlier chunk's text; first occurrence wins.
fn distinct_chunks(chunks: impl Iterator<Item = Chunk>) -> Vec<Chunk> {
    let mut seen = HashSet::new();
    chunks
        .filter(|chunk| !chunk.text.trim().is_empty())
        .filter(|chunk| seen.insert(chunk.id.clone()))
        .collect()
}
