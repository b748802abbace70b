pub mod chunk;

pub use chunk::{Chunk, ContentHash, Metadata, SourceType};
