use common::error::AppError;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Default)]
pub struct QaPayload {
    pub entries: Vec<QaEntry>,
    pub skipped: usize,
}

fn non_blank_string(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
}

/// Parses an uploaded JSON list of `{question, answer}` objects.
///
/// The payload itself must be a JSON array. Elements that are not objects, or
/// that lack a non-blank string `question` or `answer`, are skipped and counted.
pub fn parse_qa_payload(raw: &[u8]) -> Result<QaPayload, AppError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| AppError::MalformedInput(format!("QA payload is not valid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(AppError::MalformedInput(
            "QA payload must be a JSON list of {question, answer} objects".into(),
        ));
    };

    let mut payload = QaPayload::default();
    for (position, item) in items.iter().enumerate() {
        let entry = item.as_object().and_then(|object| {
            Some(QaEntry {
                question: non_blank_string(object, "question")?,
                answer: non_blank_string(object, "answer")?,
            })
        });

        match entry {
            Some(entry) => payload.entries.push(entry),
            None => {
                debug!(position, "skipping QA entry without question or answer");
                payload.skipped += 1;
            }
        }
    }

    Ok(payload)
}
