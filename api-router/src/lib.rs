use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{
    debug::dump_index,
    ingest::{upload_file, upload_qa},
    liveness::live,
    query::{query_documents, query_qa},
    readiness::ready,
};

pub mod api_state;
pub mod error;
mod routes;

/// Ingest, query and probe endpoints. The index dump is only routed when
/// `debug_endpoint_enabled` is set.
pub fn api_routes<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    let probes = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    let uploads = Router::new()
        .route("/upload_file/", post(upload_file))
        .route("/upload_qa/", post(upload_qa))
        .layer(DefaultBodyLimit::max(app_state.config.ingest_max_body_bytes));

    let queries = Router::new()
        .route("/query/", post(query_documents))
        .route("/query_qa/", post(query_qa));

    let router = probes.merge(uploads).merge(queries);

    if app_state.config.debug_endpoint_enabled {
        router.route("/debug_chromadb/", get(dump_index))
    } else {
        router
    }
}
