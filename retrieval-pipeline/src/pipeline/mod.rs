mod config;
mod strategies;

pub use config::{QueryVariant, RetrievalConfig, RetrievalTuning};
pub use strategies::{DocumentContextRetriever, QaMatchRetriever, RetrievalOutcome, Retriever};

use std::{collections::HashMap, sync::Arc};

use common::{context::RagContext, error::AppError};
use tracing::{debug, info};

use crate::prompt::build_prompt;

/// Returned verbatim when retrieval finds nothing to answer from. Never cached.
pub const NO_RELEVANT_DATA: &str = "No relevant data found.";

/// Answers queries through a per-variant [`Retriever`], sharing one response
/// cache across variants.
#[allow(clippy::module_name_repetitions)]
pub struct QueryPipeline {
    ctx: RagContext,
    config: RetrievalConfig,
    retrievers: HashMap<QueryVariant, Arc<dyn Retriever>>,
}

impl QueryPipeline {
    pub fn new(ctx: RagContext, config: RetrievalConfig) -> Self {
        let retrievers: Vec<Arc<dyn Retriever>> = vec![
            Arc::new(DocumentContextRetriever::new(
                Arc::clone(&ctx.embedder),
                Arc::clone(&ctx.index),
                &config.tuning,
            )),
            Arc::new(QaMatchRetriever::new(
                Arc::clone(&ctx.embedder),
                Arc::clone(&ctx.index),
                &config.tuning,
            )),
        ];
        Self::with_retrievers(ctx, config, retrievers)
    }

    /// A later retriever replaces an earlier one registered for the same variant.
    pub fn with_retrievers(
        ctx: RagContext,
        config: RetrievalConfig,
        retrievers: Vec<Arc<dyn Retriever>>,
    ) -> Self {
        let retrievers = retrievers
            .into_iter()
            .map(|retriever| (retriever.variant(), retriever))
            .collect();
        Self {
            ctx,
            config,
            retrievers,
        }
    }

    #[tracing::instrument(skip_all, fields(variant = %variant))]
    pub async fn answer(&self, variant: QueryVariant, user_input: &str) -> Result<String, AppError> {
        if let Some(cached) = self.ctx.cache.get(user_input).await {
            info!(cache_hit = true, "answered from response cache");
            return Ok(cached);
        }

        let retriever = self.retrievers.get(&variant).ok_or_else(|| {
            AppError::InternalError(format!("no retriever registered for {variant} queries"))
        })?;

        let context = match retriever.retrieve(user_input).await? {
            RetrievalOutcome::Found { context, result } => {
                debug!(
                    hit_count = result.hits.len(),
                    convention = ?result.convention,
                    "retrieval produced context"
                );
                context
            }
            RetrievalOutcome::NoRelevantData => {
                info!(cache_hit = false, "no relevant data for query");
                return Ok(NO_RELEVANT_DATA.to_string());
            }
        };

        let prompt = build_prompt(self.config.preamble_for(variant), &context, user_input);
        let answer = self.ctx.generator.chat(&prompt).await?;

        self.ctx
            .cache
            .put(user_input.to_string(), answer.clone())
            .await;
        info!(
            cache_hit = false,
            answer_chars = answer.chars().count(),
            "generated answer"
        );
        Ok(answer)
    }
}

#[cfg(test)]
mod tests;
