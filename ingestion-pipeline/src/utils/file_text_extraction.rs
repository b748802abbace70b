use std::path::Path;

use async_trait::async_trait;
use common::error::AppError;

use super::pdf_ingestion::extract_pdf_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Text,
}

impl FileKind {
    /// Classifies by extension only, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, AppError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") => Ok(Self::Text),
            _ => Err(AppError::UnsupportedFormat(format!(
                "'{filename}'. Please upload a PDF or text file."
            ))),
        }
    }
}

/// Turns uploaded bytes into plain text.
#[async_trait]
pub trait FileDecoder: Send + Sync {
    async fn extract_text(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AppError>;
}

/// Recognises `.pdf` and `.txt`; everything else is rejected as unsupported.
pub struct DefaultFileDecoder;

#[async_trait]
impl FileDecoder for DefaultFileDecoder {
    async fn extract_text(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AppError> {
        match FileKind::from_filename(filename)? {
            FileKind::Text => String::from_utf8(bytes)
                .map_err(|e| AppError::Extraction(format!("{filename} is not valid UTF-8: {e}"))),
            FileKind::Pdf => extract_pdf_text(bytes).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_matched_case_insensitively() {
        assert_eq!(FileKind::from_filename("report.PDF").expect("pdf"), FileKind::Pdf);
        assert_eq!(FileKind::from_filename("notes.txt").expect("txt"), FileKind::Text);
        assert_eq!(FileKind::from_filename("archive.v2.Txt").expect("txt"), FileKind::Text);
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        for name in ["notes.docx", "README", "image.png", ".txt.bak"] {
            assert!(
                matches!(FileKind::from_filename(name), Err(AppError::UnsupportedFormat(_))),
                "{name} should be unsupported"
            );
        }
    }

    #[tokio::test]
    async fn text_files_are_decoded_as_utf8() {
        let text = DefaultFileDecoder
            .extract_text("héllo wörld".as_bytes().to_vec(), "greeting.txt")
            .await
            .expect("decode");
        assert_eq!(text, "héllo wörld");
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_extraction_error() {
        let result = DefaultFileDecoder
            .extract_text(vec![0xff, 0xfe, 0x00], "broken.txt")
            .await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }

    #[tokio::test]
    async fn garbage_pdf_is_an_extraction_error() {
        let result = DefaultFileDecoder
            .extract_text(b"definitely not a pdf".to_vec(), "broken.pdf")
            .await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }
}
