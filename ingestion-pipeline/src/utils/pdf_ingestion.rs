use common::error::AppError;
use tracing::debug;

/// Extracts the text layer of a PDF on a blocking thread. Parser errors and
/// parser panics both surface as extraction errors.
pub async fn extract_pdf_text(pdf_bytes: Vec<u8>) -> Result<String, AppError> {
    let byte_len = pdf_bytes.len();
    let extraction = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&pdf_bytes)
    })
    .await
    .map_err(|err| AppError::Extraction(format!("PDF parser aborted: {err}")))?
    .map_err(|err| AppError::Extraction(format!("Failed to extract text from PDF: {err}")))?;

    let text = reflow_paragraphs(&extraction.replace('\r', ""));
    debug!(byte_len, text_chars = text.chars().count(), "extracted PDF text layer");
    Ok(text)
}

/// Joins hard-wrapped lines into paragraphs; blank lines separate paragraphs.
fn reflow_paragraphs(input: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !buffer.is_empty() {
                paragraphs.push(buffer.join(" "));
                buffer.clear();
            }
            continue;
        }
        buffer.push(trimmed);
    }
    if !buffer.is_empty() {
        paragraphs.push(buffer.join(" "));
    }

    paragraphs.join("\n\n")
}
