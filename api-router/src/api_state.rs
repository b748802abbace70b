use std::sync::Arc;

use common::{
    context::RagContext, error::AppError, storage::index::VectorIndex, utils::config::AppConfig,
};
use ingestion_pipeline::{IngestionConfig, IngestionPipeline};
use retrieval_pipeline::{QueryPipeline, RetrievalConfig};

#[derive(Clone)]
pub struct ApiState {
    pub ingestion: Arc<IngestionPipeline>,
    pub query: Arc<QueryPipeline>,
    pub index: Arc<dyn VectorIndex>,
    pub config: AppConfig,
}

impl ApiState {
    /// Builds both workflows over one shared context, so ingested chunks are
    /// immediately visible to queries.
    pub fn new(config: &AppConfig, ctx: RagContext) -> Result<Self, AppError> {
        let ingestion = IngestionPipeline::new(
            ctx.clone(),
            IngestionConfig::from_app_config(config),
        )?;
        let index = Arc::clone(&ctx.index);
        let query = QueryPipeline::new(ctx, RetrievalConfig::from_app_config(config));

        Ok(Self {
            ingestion: Arc::new(ingestion),
            query: Arc::new(query),
            index,
            config: config.clone(),
        })
    }
}
