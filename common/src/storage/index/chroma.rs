use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{IndexEntry, IndexHit, VectorIndex};
use crate::{
    error::AppError,
    storage::types::{ContentHash, Metadata},
};

const DEFAULT_TENANT: &str = "default_tenant";
const DEFAULT_DATABASE: &str = "default_database";

/// Vector index backed by a Chroma server over its v2 REST API.
pub struct ChromaVectorIndex {
    http: Client,
    collection_url: String,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: [&'a str; 1],
    embeddings: [Vec<f32>; 1],
    metadatas: [Metadata; 1],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<serde_json::Map<String, Value>>>>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    metadatas: Option<Vec<Option<serde_json::Map<String, Value>>>>,
}

fn index_error(context: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Index(format!("{context}: {err}"))
}

/// Chroma metadata values may be strings, numbers or booleans; everything is kept as text.
fn flatten_metadata(raw: Option<serde_json::Map<String, Value>>) -> Metadata {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

impl ChromaVectorIndex {
    /// Resolves (creating when missing) the named collection on the server at `base_url`.
    pub async fn connect(base_url: &str, collection_name: &str) -> Result<Self, AppError> {
        let http = Client::new();
        let collections_url = format!(
            "{}/api/v2/tenants/{DEFAULT_TENANT}/databases/{DEFAULT_DATABASE}/collections",
            base_url.trim_end_matches('/')
        );

        let collection: CollectionResponse = Self::send_json(
            http.post(&collections_url)
                .json(&json!({ "name": collection_name, "get_or_create": true })),
            "creating chroma collection",
        )
        .await?;

        info!(
            collection = collection_name,
            collection_id = %collection.id,
            "Connected to chroma collection"
        );

        Ok(Self {
            http,
            collection_url: format!("{collections_url}/{}", collection.id),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, AppError> {
        request
            .send()
            .await
            .map_err(|e| index_error(context, e))?
            .error_for_status()
            .map_err(|e| index_error(context, e))?
            .json::<T>()
            .await
            .map_err(|e| index_error(context, e))
    }
}

fn hits_from_query(response: QueryResponse) -> Vec<IndexHit> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let mut distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut metadatas = response
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    ids.into_iter()
        .map(|id| IndexHit {
            id: ContentHash::from_stored(id),
            distance: distances.next().flatten().unwrap_or(f32::MAX),
            metadata: flatten_metadata(metadatas.next().flatten()),
        })
        .collect()
}

fn entries_from_get(response: GetResponse) -> Vec<IndexEntry> {
    let mut metadatas = response.metadatas.unwrap_or_default().into_iter();
    response
        .ids
        .into_iter()
        .map(|id| IndexEntry {
            id: ContentHash::from_stored(id),
            metadata: flatten_metadata(metadatas.next().flatten()),
        })
        .collect()
}

#[async_trait]
impl VectorIndex for ChromaVectorIndex {
    fn backend_label(&self) -> &'static str {
        "chroma"
    }

    async fn upsert(
        &self,
        id: &ContentHash,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<(), AppError> {
        let body = UpsertRequest {
            ids: [id.as_str()],
            embeddings: [embedding],
            metadatas: [metadata],
        };
        let _: Value = Self::send_json(
            self.http
                .post(format!("{}/upsert", self.collection_url))
                .json(&body),
            "upserting into chroma",
        )
        .await?;
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AppError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let response: QueryResponse = Self::send_json(
            self.http
                .post(format!("{}/query", self.collection_url))
                .json(&json!({
                    "query_embeddings": [embedding],
                    "n_results": k,
                    "include": ["metadatas", "distances"],
                })),
            "querying chroma",
        )
        .await?;

        let hits = hits_from_query(response);
        debug!(requested = k, returned = hits.len(), "chroma query finished");
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, AppError> {
        Self::send_json(
            self.http.get(format!("{}/count", self.collection_url)),
            "counting chroma collection",
        )
        .await
    }

    async fn get_all(&self) -> Result<Vec<IndexEntry>, AppError> {
        let response: GetResponse = Self::send_json(
            self.http
                .post(format!("{}/get", self.collection_url))
                .json(&json!({ "include": ["metadatas"] })),
            "reading chroma collection",
        )
        .await?;
        Ok(entries_from_get(response))
    }
}
