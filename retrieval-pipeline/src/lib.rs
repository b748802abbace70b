pub mod pipeline;
pub mod prompt;
pub mod scoring;

use common::storage::types::Chunk;

pub use pipeline::{
    DocumentContextRetriever, QaMatchRetriever, QueryPipeline, QueryVariant, RetrievalConfig,
    RetrievalOutcome, RetrievalTuning, Retriever, NO_RELEVANT_DATA,
};
pub use scoring::ScoreConvention;

/// A stored chunk together with the score it was ranked by.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ranked retrieval output. `convention` says how to read each `score`.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub convention: ScoreConvention,
    pub hits: Vec<RetrievedChunk>,
}
