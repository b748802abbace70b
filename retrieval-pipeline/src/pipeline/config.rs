use std::fmt;

use common::utils::config::AppConfig;
use serde::{Deserialize, Serialize};

/// The two query endpoints differ only in how context is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryVariant {
    /// Every stored chunk nearest the query, concatenated.
    Document,
    /// The stored answer whose question best matches the query.
    Qa,
}

impl fmt::Display for QueryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QueryVariant::Document => "document",
            QueryVariant::Qa => "qa",
        };
        f.write_str(label)
    }
}

/// Tunable parameters that govern each retrieval strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTuning {
    /// Nearest neighbours considered when matching stored questions.
    pub qa_candidate_limit: usize,
    /// `None` scans every stored chunk.
    pub document_context_limit: Option<usize>,
    /// Stored questions embedded in parallel while re-scoring QA candidates.
    pub question_embedding_concurrency: usize,
}

impl Default for RetrievalTuning {
    fn default() -> Self {
        Self {
            qa_candidate_limit: 300,
            document_context_limit: None,
            question_embedding_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub tuning: RetrievalTuning,
    pub document_prompt_preamble: String,
    pub qa_prompt_preamble: String,
}

impl RetrievalConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: RetrievalTuning {
                qa_candidate_limit: config.qa_candidate_limit,
                document_context_limit: config.document_context_limit,
                ..RetrievalTuning::default()
            },
            document_prompt_preamble: config.document_prompt_preamble.clone(),
            qa_prompt_preamble: config.qa_prompt_preamble.clone(),
        }
    }

    pub fn preamble_for(&self, variant: QueryVariant) -> &str {
        match variant {
            QueryVariant::Document => &self.document_prompt_preamble,
            QueryVariant::Qa => &self.qa_prompt_preamble,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}
