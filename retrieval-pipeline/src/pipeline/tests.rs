use std::sync::Arc;

use common::{
    context::RagContext,
    error::AppError,
    storage::{
        index::{store_chunk, MemoryVectorIndex, VectorIndex},
        types::{
            chunk::{QUESTION_KEY, SOURCE_KEY, TEXT_KEY},
            Chunk, ContentHash, Metadata, SourceType,
        },
    },
    testing::{FailingGenerator, FakeEmbedder, FakeHarness},
    utils::embedding::EmbeddingProvider,
};

use super::{QueryPipeline, QueryVariant, RetrievalConfig, RetrievalTuning, NO_RELEVANT_DATA};

const DIM: usize = 2;

async fn store_qa(index: &dyn VectorIndex, question: &str, answer: &str, vector: Vec<f32>) {
    let chunk = Chunk::new(answer.to_string(), SourceType::Qa).with_metadata(QUESTION_KEY, question);
    store_chunk(index, &chunk, vector).await.expect("store qa");
}

async fn store_document(index: &dyn VectorIndex, text: &str, vector: Vec<f32>) {
    let chunk = Chunk::new(text.to_string(), SourceType::Document);
    store_chunk(index, &chunk, vector).await.expect("store document");
}

fn config_with(tuning: RetrievalTuning) -> RetrievalConfig {
    RetrievalConfig {
        tuning,
        document_prompt_preamble: "DOC".into(),
        qa_prompt_preamble: "QA".into(),
    }
}

#[tokio::test]
async fn cached_answer_skips_embedding_and_generation() {
    let embedder = FakeEmbedder::new(DIM)
        .pin("What is X?", vec![1.0, 0.0])
        .pin("X is Y.", vec![1.0, 0.0]);
    let harness = FakeHarness::new(embedder, "X is Y, apparently.");
    store_qa(harness.index.as_ref(), "What is X?", "X is Y.", vec![1.0, 0.0]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), RetrievalConfig::default());

    let first = pipeline
        .answer(QueryVariant::Qa, "What is X?")
        .await
        .expect("first answer");
    let embed_calls = harness.embedder.calls();
    let generator_calls = harness.generator.calls();

    let second = pipeline
        .answer(QueryVariant::Qa, "What is X?")
        .await
        .expect("second answer");

    assert_eq!(first, "X is Y, apparently.");
    assert_eq!(second, first);
    assert_eq!(harness.embedder.calls(), embed_calls);
    assert_eq!(harness.generator.calls(), generator_calls);
    assert_eq!(generator_calls, 1);
}

#[tokio::test]
async fn cache_keys_are_exact_strings() {
    let harness = FakeHarness::new(FakeEmbedder::new(DIM), "an answer");
    store_document(harness.index.as_ref(), "Some document text.", vec![0.5, 0.5]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), RetrievalConfig::default());

    pipeline
        .answer(QueryVariant::Document, "What is X?")
        .await
        .expect("answer");
    pipeline
        .answer(QueryVariant::Document, "what is x?")
        .await
        .expect("answer");

    assert_eq!(harness.generator.calls(), 2);
    assert_eq!(harness.ctx.cache.len().await, 2);
}

#[tokio::test]
async fn empty_index_returns_sentinel_without_caching() {
    let harness = FakeHarness::new(FakeEmbedder::new(DIM), "should not be used");
    let pipeline = QueryPipeline::new(harness.ctx.clone(), RetrievalConfig::default());

    for variant in [QueryVariant::Qa, QueryVariant::Document] {
        let answer = pipeline.answer(variant, "anything?").await.expect("answer");
        assert_eq!(answer, NO_RELEVANT_DATA);
    }

    assert_eq!(harness.generator.calls(), 0);
    assert!(harness.ctx.cache.is_empty().await);
}

#[tokio::test]
async fn qa_query_without_stored_questions_is_no_relevant_data() {
    let harness = FakeHarness::new(FakeEmbedder::new(DIM), "unused");
    store_document(harness.index.as_ref(), "Plain document chunk.", vec![1.0, 0.0]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), RetrievalConfig::default());

    let answer = pipeline
        .answer(QueryVariant::Qa, "What is X?")
        .await
        .expect("answer");

    assert_eq!(answer, NO_RELEVANT_DATA);
    assert_eq!(harness.generator.calls(), 0);
    assert!(!harness.ctx.cache.contains("What is X?").await);
}

#[tokio::test]
async fn qa_tie_goes_to_the_nearer_index_hit() {
    let embedder = FakeEmbedder::new(DIM)
        .pin("query", vec![1.0, 0.0])
        .pin("First question?", vec![0.5, 0.5])
        .pin("Second question?", vec![0.5, 0.5]);
    let harness = FakeHarness::new(embedder, "generated");
    // Stored second but nearer to the query, so it leads the index order.
    store_qa(harness.index.as_ref(), "First question?", "far answer", vec![0.0, 1.0]).await;
    store_qa(harness.index.as_ref(), "Second question?", "near answer", vec![1.0, 0.1]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), config_with(RetrievalTuning::default()));

    pipeline.answer(QueryVariant::Qa, "query").await.expect("answer");

    let prompts = harness.generator.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Context:\nnear answer\n"));
    assert!(!prompts[0].contains("far answer"));
}

#[tokio::test]
async fn qa_match_prefers_the_best_question_over_index_order() {
    let embedder = FakeEmbedder::new(DIM)
        .pin("How tall is the tower?", vec![0.0, 1.0])
        .pin("When does the shop open?", vec![1.0, 0.0])
        .pin("How tall is it?", vec![0.0, 2.0]);
    let harness = FakeHarness::new(embedder, "generated");
    store_qa(harness.index.as_ref(), "When does the shop open?", "At nine.", vec![0.0, 1.0]).await;
    store_qa(harness.index.as_ref(), "How tall is it?", "Three hundred metres.", vec![1.0, 1.0]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), config_with(RetrievalTuning::default()));

    pipeline
        .answer(QueryVariant::Qa, "How tall is the tower?")
        .await
        .expect("answer");

    let prompts = harness.generator.prompts().await;
    assert_eq!(
        prompts[0],
        "QA\n\nContext:\nThree hundred metres.\n\nUser Question:\nHow tall is the tower?\n\nAnswer:"
    );
}

#[tokio::test]
async fn qa_pairs_with_blank_answers_never_win() {
    let embedder = FakeEmbedder::new(DIM)
        .pin("How tall is the tower?", vec![0.0, 1.0])
        .pin("How tall is it?", vec![0.0, 2.0])
        .pin("Roughly how tall?", vec![0.0, 1.0]);
    let harness = FakeHarness::new(embedder, "generated");
    let blank = Metadata::from([
        (TEXT_KEY.to_string(), "   ".to_string()),
        (SOURCE_KEY.to_string(), SourceType::Qa.as_str().to_string()),
        (QUESTION_KEY.to_string(), "How tall is it?".to_string()),
    ]);
    harness
        .index
        .upsert(&ContentHash::of("blank answer"), vec![0.0, 1.0], blank)
        .await
        .expect("upsert blank");
    store_qa(harness.index.as_ref(), "Roughly how tall?", "Three hundred metres.", vec![1.0, 1.0]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), config_with(RetrievalTuning::default()));

    pipeline
        .answer(QueryVariant::Qa, "How tall is the tower?")
        .await
        .expect("answer");

    let prompts = harness.generator.prompts().await;
    assert_eq!(
        prompts[0],
        "QA\n\nContext:\nThree hundred metres.\n\nUser Question:\nHow tall is the tower?\n\nAnswer:"
    );
    assert!(!harness.embedder.seen().await.contains(&"How tall is it?".to_string()));
}

#[tokio::test]
async fn document_context_joins_every_chunk_nearest_first() {
    let embedder = FakeEmbedder::new(DIM).pin("question", vec![1.0, 0.0]);
    let harness = FakeHarness::new(embedder, "generated");
    store_document(harness.index.as_ref(), "far chunk", vec![-1.0, 0.0]).await;
    store_document(harness.index.as_ref(), "near chunk", vec![1.0, 0.0]).await;
    store_document(harness.index.as_ref(), "middle chunk", vec![0.0, 1.0]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), config_with(RetrievalTuning::default()));

    pipeline
        .answer(QueryVariant::Document, "question")
        .await
        .expect("answer");

    let prompts = harness.generator.prompts().await;
    assert_eq!(
        prompts[0],
        "DOC\n\nContext:\nnear chunk\nmiddle chunk\nfar chunk\n\nUser Question:\nquestion\n\nAnswer:"
    );
}

#[tokio::test]
async fn document_context_limit_bounds_the_candidates() {
    let embedder = FakeEmbedder::new(DIM).pin("question", vec![1.0, 0.0]);
    let harness = FakeHarness::new(embedder, "generated");
    store_document(harness.index.as_ref(), "far chunk", vec![-1.0, 0.0]).await;
    store_document(harness.index.as_ref(), "near chunk", vec![1.0, 0.0]).await;
    let tuning = RetrievalTuning {
        document_context_limit: Some(1),
        ..RetrievalTuning::default()
    };
    let pipeline = QueryPipeline::new(harness.ctx.clone(), config_with(tuning));

    pipeline
        .answer(QueryVariant::Document, "question")
        .await
        .expect("answer");

    let prompts = harness.generator.prompts().await;
    assert!(prompts[0].contains("Context:\nnear chunk\n\n"));
    assert!(!prompts[0].contains("far chunk"));
}

#[tokio::test]
async fn cache_is_shared_between_variants() {
    let harness = FakeHarness::new(FakeEmbedder::new(DIM), "cached answer");
    store_document(harness.index.as_ref(), "Some text.", vec![0.3, 0.3]).await;
    let pipeline = QueryPipeline::new(harness.ctx.clone(), RetrievalConfig::default());

    pipeline
        .answer(QueryVariant::Document, "shared?")
        .await
        .expect("answer");
    let from_qa = pipeline
        .answer(QueryVariant::Qa, "shared?")
        .await
        .expect("answer");

    assert_eq!(from_qa, "cached answer");
    assert_eq!(harness.generator.calls(), 1);
}

#[tokio::test]
async fn generator_failure_is_a_provider_error_and_is_not_cached() {
    let embedder = Arc::new(FakeEmbedder::new(DIM));
    let index = Arc::new(MemoryVectorIndex::new());
    store_document(index.as_ref(), "Some text.", vec![0.3, 0.3]).await;
    let ctx = RagContext::new(
        embedder as Arc<dyn EmbeddingProvider>,
        index as Arc<dyn VectorIndex>,
        Arc::new(FailingGenerator),
    );
    let pipeline = QueryPipeline::new(ctx.clone(), RetrievalConfig::default());

    let result = pipeline.answer(QueryVariant::Document, "question").await;

    assert!(matches!(result, Err(AppError::Provider(_))));
    assert!(ctx.cache.is_empty().await);
}
