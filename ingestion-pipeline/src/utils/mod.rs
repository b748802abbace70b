pub mod chunking;
pub mod file_text_extraction;
pub mod pdf_ingestion;
pub mod qa_payload;
