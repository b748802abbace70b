use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const TEXT_KEY: &str = "text";
pub const SOURCE_KEY: &str = "source";
pub const FILENAME_KEY: &str = "filename";
pub const QUESTION_KEY: &str = "question";

pub type Metadata = BTreeMap<String, String>;

/// Lowercase hex SHA-256 of a chunk's exact bytes; doubles as the index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(format!("{digest:x}"))
    }

    /// Wraps an id handed back by the vector index without re-hashing.
    pub fn from_stored(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Document,
    Qa,
}

impl SourceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Qa => "qa",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "qa" => Self::Qa,
            _ => Self::Document,
        }
    }
}

/// A bounded segment of source text together with its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ContentHash,
    pub text: String,
    pub source_type: SourceType,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: String, source_type: SourceType) -> Self {
        Self {
            id: ContentHash::of(&text),
            text,
            source_type,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn question(&self) -> Option<&str> {
        self.metadata
            .get(QUESTION_KEY)
            .map(String::as_str)
            .filter(|q| !q.trim().is_empty())
    }

    /// Flattens the chunk into the metadata map stored alongside its vector.
    pub fn to_index_metadata(&self) -> Metadata {
        let mut flat = self.metadata.clone();
        flat.insert(TEXT_KEY.to_string(), self.text.clone());
        flat.insert(SOURCE_KEY.to_string(), self.source_type.as_str().to_string());
        flat
    }

    /// Rebuilds a chunk from an index row. Missing fields degrade to an empty
    /// text and the document source type.
    pub fn from_index_metadata(id: ContentHash, mut metadata: Metadata) -> Self {
        let text = metadata.remove(TEXT_KEY).unwrap_or_default();
        let source_type = metadata
            .remove(SOURCE_KEY)
            .map_or(SourceType::Document, |s| SourceType::parse(&s));
        Self {
            id,
            text,
            source_type,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable_sha256() {
        let hash = ContentHash::of("hello world");
        assert_eq!(
            hash.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(hash, ContentHash::of("hello world"));
        assert_ne!(hash, ContentHash::of("hello world "));
    }

    #[test]
    fn same_text_yields_same_chunk_id() {
        let a = Chunk::new("X is Y.".into(), SourceType::Qa);
        let b = Chunk::new("X is Y.".into(), SourceType::Document);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn index_metadata_survives_the_trip_through_the_index() {
        let chunk = Chunk::new("X is Y.".into(), SourceType::Qa).with_metadata(QUESTION_KEY, "What is X?");
        let flat = chunk.to_index_metadata();
        assert_eq!(flat.get(TEXT_KEY).map(String::as_str), Some("X is Y."));
        assert_eq!(flat.get(SOURCE_KEY).map(String::as_str), Some("qa"));

        let rebuilt = Chunk::from_index_metadata(chunk.id.clone(), flat);
        assert_eq!(rebuilt, chunk);
        assert_eq!(rebuilt.question(), Some("What is X?"));
    }

    #[test]
    fn sparse_index_rows_degrade_gracefully() {
        let chunk = Chunk::from_index_metadata(ContentHash::from_stored("abc"), Metadata::new());
        assert!(chunk.text.is_empty());
        assert_eq!(chunk.source_type, SourceType::Document);
        assert_eq!(chunk.question(), None);
    }
}
