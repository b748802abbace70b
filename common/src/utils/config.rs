use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAI,
    Hashed,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::OpenAI
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Memory,
    Chroma,
}

fn default_vector_backend() -> VectorBackend {
    VectorBackend::Memory
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_api_key")]
    pub openai_api_key: String,
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Only used by the hashed backend; remote models report their own dimension.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_vector_backend")]
    pub vector_backend: VectorBackend,
    #[serde(default = "default_chroma_url")]
    pub chroma_url: String,
    #[serde(default = "default_chroma_collection")]
    pub chroma_collection: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_qa_candidate_limit")]
    pub qa_candidate_limit: usize,
    /// Unset means every stored chunk is handed to the document prompt.
    #[serde(default)]
    pub document_context_limit: Option<usize>,
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
    #[serde(default = "default_provider_max_retries")]
    pub provider_max_retries: usize,
    #[serde(default = "default_document_prompt_preamble")]
    pub document_prompt_preamble: String,
    #[serde(default = "default_qa_prompt_preamble")]
    pub qa_prompt_preamble: String,
    #[serde(default)]
    pub debug_endpoint_enabled: bool,
    #[serde(default = "default_ingest_max_body_bytes")]
    pub ingest_max_body_bytes: usize,
}

fn default_http_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_api_key() -> String {
    "ollama".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

const fn default_embedding_dimension() -> usize {
    768
}

fn default_chat_model() -> String {
    "partai/dorna-llama3:latest".to_string()
}

fn default_chroma_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_chroma_collection() -> String {
    "rag_collection".to_string()
}

const fn default_chunk_size() -> usize {
    1000
}

const fn default_chunk_overlap() -> usize {
    50
}

const fn default_qa_candidate_limit() -> usize {
    300
}

const fn default_provider_timeout_secs() -> u64 {
    60
}

const fn default_provider_max_retries() -> usize {
    2
}

fn default_document_prompt_preamble() -> String {
    "You are a helpful assistant. Answer the question using only the context below.".to_string()
}

fn default_qa_prompt_preamble() -> String {
    "You are a helpful assistant answering on behalf of the organisation. Base your answer on the matched reference answer below.".to_string()
}

const fn default_ingest_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

impl AppConfig {
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            openai_base_url: default_base_url(),
            openai_api_key: default_api_key(),
            embedding_backend: default_embedding_backend(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            chat_model: default_chat_model(),
            vector_backend: default_vector_backend(),
            chroma_url: default_chroma_url(),
            chroma_collection: default_chroma_collection(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            qa_candidate_limit: default_qa_candidate_limit(),
            document_context_limit: None,
            provider_timeout_secs: default_provider_timeout_secs(),
            provider_max_retries: default_provider_max_retries(),
            document_prompt_preamble: default_document_prompt_preamble(),
            qa_prompt_preamble: default_qa_prompt_preamble(),
            debug_endpoint_enabled: false,
            ingest_max_body_bytes: default_ingest_max_body_bytes(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, AppError> {
    load_config(
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::default()),
    )
}

fn load_config(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, AppError> {
    Ok(builder.build()?.try_deserialize()?)
}
