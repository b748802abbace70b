pub mod cache;
pub mod index;
pub mod types;
