use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use tracing::info;

use crate::{
    error::AppError,
    storage::{
        cache::ResponseCache,
        index::{ChromaVectorIndex, MemoryVectorIndex, VectorIndex},
    },
    utils::{
        config::{AppConfig, EmbeddingBackend, VectorBackend},
        embedding::{EmbeddingProvider, HashedEmbedder, OpenAiEmbedder},
        llm::{AnswerGenerator, OpenAiChatGenerator},
        provider_call::{CallPolicy, GuardedEmbedder, GuardedGenerator},
    },
};

/// The collaborators shared by the ingest and query workflows.
#[derive(Clone)]
pub struct RagContext {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub generator: Arc<dyn AnswerGenerator>,
    pub cache: Arc<ResponseCache>,
}

impl RagContext {
    /// Wires injected collaborators together with a fresh, empty response cache.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            cache: Arc::new(ResponseCache::new()),
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let policy = CallPolicy::new(config.provider_timeout(), config.provider_max_retries);
        let openai_client = Arc::new(Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));

        let embedder: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
            EmbeddingBackend::OpenAI => Arc::new(OpenAiEmbedder::new(
                Arc::clone(&openai_client),
                &config.embedding_model,
            )),
            EmbeddingBackend::Hashed => Arc::new(HashedEmbedder::new(config.embedding_dimension)),
        };

        let index: Arc<dyn VectorIndex> = match config.vector_backend {
            VectorBackend::Memory => Arc::new(MemoryVectorIndex::new()),
            VectorBackend::Chroma => Arc::new(
                ChromaVectorIndex::connect(&config.chroma_url, &config.chroma_collection).await?,
            ),
        };

        let generator: Arc<dyn AnswerGenerator> =
            Arc::new(OpenAiChatGenerator::new(openai_client, &config.chat_model));

        info!(
            embedding_backend = embedder.backend_label(),
            embedding_model = %config.embedding_model,
            vector_backend = index.backend_label(),
            chat_model = %config.chat_model,
            timeout_secs = config.provider_timeout_secs,
            max_retries = config.provider_max_retries,
            "RAG context initialized"
        );

        Ok(Self::new(
            Arc::new(GuardedEmbedder::new(embedder, policy)),
            index,
            Arc::new(GuardedGenerator::new(generator, policy)),
        ))
    }
}
