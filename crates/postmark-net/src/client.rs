//! Gateway client: GraphQL metadata queries and payload requests.

use crate::error::{NetError, NetResult};
use postmark_core::config::GatewayConfig;
use postmark_core::memory::{AppIdentity, Memory, Tag, Visibility, tag_names};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Default page size for memory queries.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

const MEMORIES_QUERY: &str = r#"
query Memories($owners: [String!], $tags: [TagFilter!], $first: Int) {
  transactions(owners: $owners, tags: $tags, first: $first, sort: HEIGHT_DESC) {
    edges { node { id tags { name value } } }
  }
}"#;

const MEMORY_QUERY: &str = r#"query Memory($id: ID!) {
  transaction(id: $id) { id tags { name value } }
}"#;

/// Filter for [`GatewayClient::query_memories`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryQuery {
    /// Restrict to these uploader addresses; empty means everyone.
    pub owners: Vec<String>,
    pub visibility: Option<Visibility>,
    pub first: u32,
}

impl Default for MemoryQuery {
    fn default() -> Self {
        Self {
            owners: Vec::new(),
            visibility: None,
            first: DEFAULT_PAGE_SIZE,
        }
    }
}

impl MemoryQuery {
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.push(owner.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// GraphQL variables for this query, scoped to `app_name`.
    pub fn variables(&self, app_name: &str) -> Value {
        let mut tags = vec![json!({ "name": tag_names::APP_NAME, "values": [app_name] })];
        if let Some(visibility) = self.visibility {
            tags.push(json!({ "name": tag_names::VISIBILITY, "values": [visibility.as_str()] }));
        }
        json!({
            "owners": if self.owners.is_empty() { Value::Null } else { json!(self.owners) },
            "tags": tags,
            "first": self.first,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    transactions: Connection,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    transaction: Option<Node>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Node,
}

#[derive(Debug, Deserialize)]
struct Node {
    id: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

/// HTTP client for the storage gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    graphql_endpoint: String,
    origin: String,
    app: AppIdentity,
}

impl GatewayClient {
    pub fn new(gateway: &GatewayConfig, app: AppIdentity) -> Self {
        Self::with_client(reqwest::Client::new(), gateway, app)
    }

    pub fn with_client(http: reqwest::Client, gateway: &GatewayConfig, app: AppIdentity) -> Self {
        Self {
            http,
            graphql_endpoint: gateway.graphql_endpoint.clone(),
            origin: gateway.origin.trim_end_matches('/').to_string(),
            app,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn app(&self) -> &AppIdentity {
        &self.app
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Gateway URL for a stored payload.
    pub fn memory_url(&self, id: &str) -> String {
        format!("{}/{}", self.origin, id)
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> NetResult<T> {
        let response = self
            .http
            .post(&self.graphql_endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetError::Status {
                status: status.as_u16(),
                url: self.graphql_endpoint.clone(),
            });
        }
        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| NetError::Decode(e.to_string()))?;
        if let Some(error) = body.errors.first() {
            return Err(NetError::GraphQl(error.message.clone()));
        }
        body.data
            .ok_or_else(|| NetError::GraphQl("Response has no data".to_string()))
    }

    /// Memories matching `query`, newest first. Items from other apps are skipped.
    pub async fn query_memories(&self, query: &MemoryQuery) -> NetResult<Vec<Memory>> {
        let data: TransactionsData = self
            .graphql(MEMORIES_QUERY, query.variables(&self.app.name))
            .await?;
        let total = data.transactions.edges.len();
        let memories: Vec<Memory> = data
            .transactions
            .edges
            .into_iter()
            .filter_map(|edge| Memory::from_tags(edge.node.id, &edge.node.tags, &self.app.name))
            .collect();
        log::debug!("Queried {} memories ({} skipped)", memories.len(), total - memories.len());
        Ok(memories)
    }

    /// A single memory, or `None` when unknown or owned by another app.
    pub async fn fetch_memory(&self, id: &str) -> NetResult<Option<Memory>> {
        let data: TransactionData = self.graphql(MEMORY_QUERY, json!({ "id": id })).await?;
        Ok(data
            .transaction
            .and_then(|node| Memory::from_tags(node.id, &node.tags, &self.app.name)))
    }

    /// One `HEAD` request: true when the gateway serves an image for `id`.
    pub async fn probe(&self, id: &str) -> NetResult<bool> {
        let url = self.memory_url(id);
        let response = self.http.head(&url).send().await?;
        if !response.status().is_success() {
            log::debug!("Probe {}: {}", url, response.status());
            return Ok(false);
        }
        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("image/"));
        Ok(is_image)
    }

    /// Download a payload.
    pub async fn fetch_bytes(&self, url: &str) -> NetResult<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gateway, serve};
    use axum::Json;
    use axum::http::{StatusCode, header};
    use axum::routing::{get, post};
    use std::sync::{Arc, Mutex};

    fn node(id: &str, app: &str, title: &str) -> Value {
        json!({ "node": { "id": id, "tags": [
            { "name": "App-Name", "value": app },
            { "name": "Content-Type", "value": "image/png" },
            { "name": "Title", "value": title },
        ]}})
    }

    #[tokio::test]
    async fn test_query_memories_skips_foreign_items() {
        let seen = Arc::new(Mutex::new(Value::Null));
        let captured = seen.clone();
        let router = axum::Router::new().route(
            "/graphql",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = body;
                    Json(json!({ "data": { "transactions": { "edges": [
                        node("a", "Postmark", "Harbor"),
                        node("b", "SomethingElse", "Nope"),
                        node("c", "Postmark", "Dunes"),
                    ]}}}))
                }
            }),
        );
        let base = serve(router).await;
        let client = GatewayClient::new(&gateway(&base), AppIdentity::default());

        let query = MemoryQuery::default().owner("owner-1");
        let memories = client.query_memories(&query).await.unwrap();
        let ids: Vec<_> = memories.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(memories[1].title.as_deref(), Some("Dunes"));

        let body = seen.lock().unwrap().clone();
        assert_eq!(body["variables"]["owners"], json!(["owner-1"]));
        assert_eq!(body["variables"]["tags"][0]["values"], json!(["Postmark"]));
        assert_eq!(body["variables"]["first"], json!(100));
    }

    #[tokio::test]
    async fn test_graphql_errors() {
        let router = axum::Router::new().route(
            "/graphql",
            post(|| async { Json(json!({ "errors": [{ "message": "rate limited" }] })) }),
        );
        let base = serve(router).await;
        let client = GatewayClient::new(&gateway(&base), AppIdentity::default());
        let err = client.fetch_memory("a").await.unwrap_err();
        assert!(matches!(err, NetError::GraphQl(ref m) if m.as_str() == "rate limited"));
    }

    #[tokio::test]
    async fn test_fetch_memory_not_found() {
        let router = axum::Router::new().route(
            "/graphql",
            post(|| async { Json(json!({ "data": { "transaction": null } })) }),
        );
        let base = serve(router).await;
        let client = GatewayClient::new(&gateway(&base), AppIdentity::default());
        assert_eq!(client.fetch_memory("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_probe_requires_image_content() {
        let router = axum::Router::new()
            .route("/img", get(|| async { ([(header::CONTENT_TYPE, "image/jpeg")], "jpeg") }))
            .route("/text", get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html>") }))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }));
        let base = serve(router).await;
        let client = GatewayClient::new(&gateway(&base), AppIdentity::default());

        assert!(client.probe("img").await.unwrap());
        assert!(!client.probe("text").await.unwrap());
        assert!(!client.probe("gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_bytes_status() {
        let router = axum::Router::new()
            .route("/ok", get(|| async { "payload" }))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }));
        let base = serve(router).await;
        let client = GatewayClient::new(&gateway(&base), AppIdentity::default());

        assert_eq!(client.fetch_bytes(&client.memory_url("ok")).await.unwrap(), b"payload");
        assert!(matches!(
            client.fetch_bytes(&client.memory_url("gone")).await,
            Err(NetError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_variables_without_owner() {
        let vars = MemoryQuery::default()
            .visibility(Visibility::Public)
            .variables("Postmark");
        assert_eq!(vars["owners"], Value::Null);
        assert_eq!(vars["tags"][1]["name"], json!("Visibility"));
        assert_eq!(vars["tags"][1]["values"], json!(["public"]));
    }
}
