mod chroma;
mod memory;

pub use chroma::ChromaVectorIndex;
pub use memory::MemoryVectorIndex;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    error::AppError,
    storage::types::{Chunk, ContentHash, Metadata},
};

/// One nearest-neighbour row. `distance` is lower-is-closer.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub id: ContentHash,
    pub metadata: Metadata,
    pub distance: f32,
}

impl IndexHit {
    pub fn into_chunk(self) -> Chunk {
        Chunk::from_index_metadata(self.id, self.metadata)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub id: ContentHash,
    pub metadata: Metadata,
}

/// Storage for `(id, vector, metadata)` triples. Implementations own their
/// concurrency control and must tolerate concurrent readers and writers.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn backend_label(&self) -> &'static str;

    /// Inserts the triple, overwriting any entry already stored under `id`.
    async fn upsert(
        &self,
        id: &ContentHash,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<(), AppError>;

    /// Returns up to `k` entries ordered nearest first.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AppError>;

    async fn count(&self) -> Result<usize, AppError>;

    /// Every stored entry, ordered nearest first.
    async fn scan_ranked(&self, embedding: &[f32]) -> Result<Vec<IndexHit>, AppError> {
        let total = self.count().await?;
        if total == 0 {
            return Ok(Vec::new());
        }
        self.query(embedding, total).await
    }

    /// Raw dump of the stored metadata, for introspection only.
    async fn get_all(&self) -> Result<Vec<IndexEntry>, AppError>;
}

/// Persists a chunk under its content hash. Chunks without text never reach the index.
pub async fn store_chunk(
    index: &dyn VectorIndex,
    chunk: &Chunk,
    embedding: Vec<f32>,
) -> Result<(), AppError> {
    if chunk.text.trim().is_empty() {
        return Err(AppError::Validation(
            "refusing to store a chunk with empty text".into(),
        ));
    }
    index
        .upsert(&chunk.id, embedding, chunk.to_index_metadata())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::SourceType;

    #[tokio::test]
    async fn store_chunk_rejects_blank_text() {
        let index = MemoryVectorIndex::new();
        let chunk = Chunk::new("   ".into(), SourceType::Document);

        let result = store_chunk(&index, &chunk, vec![1.0, 0.0]).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(index.count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn scan_ranked_returns_every_entry() {
        let index = MemoryVectorIndex::new();
        for (i, text) in ["alpha", "beta", "gamma"].iter().enumerate() {
            let chunk = Chunk::new((*text).to_string(), SourceType::Document);
            store_chunk(&index, &chunk, vec![i as f32, 0.0])
                .await
                .expect("store");
        }

        let hits = index.scan_ranked(&[2.0, 0.0]).await.expect("scan");

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].clone().into_chunk().text, "gamma");
        assert_eq!(hits[2].clone().into_chunk().text, "alpha");
    }

    #[tokio::test]
    async fn scan_ranked_on_empty_index_is_empty() {
        let index = MemoryVectorIndex::new();
        assert!(index.scan_ranked(&[1.0]).await.expect("scan").is_empty());
    }
}
