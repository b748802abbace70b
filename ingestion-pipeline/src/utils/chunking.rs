use common::error::AppError;
use text_splitter::{Characters, ChunkConfig, TextSplitter};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Splits text into overlapping windows of at most `chunk_size` characters,
/// preferring paragraph, sentence and word boundaries over hard cuts.
pub struct Chunker {
    splitter: TextSplitter<Characters>,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::Validation("chunk_size must be positive".into()));
        }
        if overlap >= chunk_size {
            return Err(AppError::Validation(format!(
                "chunk overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .map_err(|e| AppError::Validation(format!("invalid chunk overlap: {e}")))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    /// Empty or whitespace-only input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.splitter.chunks(text).map(str::to_owned).collect()
    }
}

pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, AppError> {
    Ok(Chunker::new(chunk_size, overlap)?.split(text))
}
