use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;

use super::{IndexEntry, IndexHit, VectorIndex};
use crate::{
    error::AppError,
    storage::types::{ContentHash, Metadata},
};

struct StoredVector {
    id: ContentHash,
    embedding: Vec<f32>,
    metadata: Metadata,
}

#[derive(Default)]
struct MemoryState {
    entries: Vec<StoredVector>,
    positions: HashMap<ContentHash, usize>,
}

/// Process-local index using squared euclidean distance. Ties keep insertion
/// order and an overwrite keeps the entry's original position.
#[derive(Default)]
pub struct MemoryVectorIndex {
    state: RwLock<MemoryState>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Index("in-memory index lock poisoned".into())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn check_finite(embedding: &[f32]) -> Result<(), AppError> {
    if embedding.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(AppError::Index("embedding contains non-finite values".into()))
    }
}

fn check_dimension(expected: usize, got: usize) -> Result<(), AppError> {
    if expected == got {
        Ok(())
    } else {
        Err(AppError::Index(format!(
            "embedding dimension {got} does not match index dimension {expected}"
        )))
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    fn backend_label(&self) -> &'static str {
        "memory"
    }

    async fn upsert(
        &self,
        id: &ContentHash,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<(), AppError> {
        check_finite(&embedding)?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if let Some(first) = state.entries.first() {
            check_dimension(first.embedding.len(), embedding.len())?;
        }

        match state.positions.get(id).copied() {
            Some(position) => {
                let slot = &mut state.entries[position];
                slot.embedding = embedding;
                slot.metadata = metadata;
            }
            None => {
                let position = state.entries.len();
                state.entries.push(StoredVector {
                    id: id.clone(),
                    embedding,
                    metadata,
                });
                state.positions.insert(id.clone(), position);
            }
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AppError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        if k == 0 || state.entries.is_empty() {
            return Ok(Vec::new());
        }
        check_dimension(state.entries[0].embedding.len(), embedding.len())?;
        check_finite(embedding)?;

        let mut ranked: Vec<(usize, f32)> = state
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, squared_l2(embedding, &entry.embedding)))
            .collect();
        // Stable sort: equal distances stay in insertion order. Distances that
        // overflow to infinity still compare totally.
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(position, distance)| {
                let entry = &state.entries[position];
                IndexHit {
                    id: entry.id.clone(),
                    metadata: entry.metadata.clone(),
                    distance,
                }
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.state.read().map_err(|_| poisoned())?.entries.len())
    }

    async fn get_all(&self) -> Result<Vec<IndexEntry>, AppError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .entries
            .iter()
            .map(|entry| IndexEntry {
                id: entry.id.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect())
    }
}
