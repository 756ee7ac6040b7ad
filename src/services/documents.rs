use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::{CollectionSettings, DocumentSettings};

/// Errors that can occur when interacting with the document store
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// One Appwrite query, serialized as its JSON form
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(&'static str, Vec<Value>),
    Contains(&'static str, Value),
    GreaterThanEqual(&'static str, Value),
    OrderAsc(&'static str),
    OrderDesc(&'static str),
    Limit(u32),
    Offset(u32),
}

impl Query {
    pub fn equal<V: Into<Value>>(attribute: &'static str, value: V) -> Self {
        Query::Equal(attribute, vec![value.into()])
    }

    pub fn equal_any<V: Into<Value>>(attribute: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        Query::Equal(attribute, values.into_iter().map(Into::into).collect())
    }

    pub fn to_json(&self) -> String {
        let value = match self {
            Query::Equal(attr, values) => json!({ "method": "equal", "attribute": attr, "values": values }),
            Query::Contains(attr, value) => json!({ "method": "contains", "attribute": attr, "values": [value] }),
            Query::GreaterThanEqual(attr, value) => {
                json!({ "method": "greaterThanEqual", "attribute": attr, "values": [value] })
            }
            Query::OrderAsc(attr) => json!({ "method": "orderAsc", "attribute": attr }),
            Query::OrderDesc(attr) => json!({ "method": "orderDesc", "attribute": attr }),
            Query::Limit(n) => json!({ "method": "limit", "values": [n] }),
            Query::Offset(n) => json!({ "method": "offset", "values": [n] }),
        };
        value.to_string()
    }
}

/// A page of documents plus the server's total for the query
#[derive(Debug, Clone)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Value>,
}

/// Appwrite-compatible document database client
///
/// Handles transport concerns only: URLs, auth headers, status mapping and
/// paging. Domain translation lives in `document_store`.
pub struct DocumentClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    page_size: u32,
    client: Client,
    pub collections: CollectionSettings,
}

impl DocumentClient {
    pub fn new(settings: &DocumentSettings) -> Result<Self, DocumentError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            project_id: settings.project_id.clone(),
            database_id: settings.database_id.clone(),
            page_size: settings.page_size.max(1),
            client,
            collections: settings.collections.clone(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url, self.database_id, collection
        )
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
    }

    async fn check(response: Response, what: &str) -> Result<Response, DocumentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DocumentError::Unauthorized),
            StatusCode::NOT_FOUND => Err(DocumentError::NotFound(what.to_string())),
            StatusCode::CONFLICT => Err(DocumentError::Conflict(what.to_string())),
            _ => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Document store error for {}: {} - {}", what, status, body);
                Err(DocumentError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }

    /// List one page of documents matching `queries`
    pub async fn list(&self, collection: &str, queries: &[Query]) -> Result<DocumentList, DocumentError> {
        let mut url = self.documents_url(collection);
        for (i, query) in queries.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str("queries[]=");
            url.push_str(&urlencoding::encode(&query.to_json()));
        }

        tracing::debug!("Listing documents from {}", url);

        let response = self.authed(self.client.get(&url)).send().await?;
        let response = Self::check(response, collection).await?;
        let json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .cloned()
            .ok_or_else(|| DocumentError::InvalidResponse("Missing documents array".into()))?;

        Ok(DocumentList { total, documents })
    }

    /// List every matching document, paging by `page_size`
    pub async fn list_all(&self, collection: &str, queries: Vec<Query>) -> Result<Vec<Value>, DocumentError> {
        let mut all = Vec::new();
        let mut offset = 0u32;

        loop {
            let mut page_queries = queries.clone();
            page_queries.push(Query::Limit(self.page_size));
            page_queries.push(Query::Offset(offset));

            let page = self.list(collection, &page_queries).await?;
            let fetched = page.documents.len() as u32;
            all.extend(page.documents);

            if fetched < self.page_size || all.len() as u64 >= page.total {
                break;
            }
            offset += fetched;
        }

        Ok(all)
    }

    /// Count matching documents without transferring them
    pub async fn count(&self, collection: &str, mut queries: Vec<Query>) -> Result<u64, DocumentError> {
        queries.push(Query::Limit(1));
        Ok(self.list(collection, &queries).await?.total)
    }

    /// Fetch a document by id; `None` when it does not exist
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DocumentError> {
        let url = format!("{}/{}", self.documents_url(collection), urlencoding::encode(id));

        let response = self.authed(self.client.get(&url)).send().await?;
        match Self::check(response, id).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(DocumentError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a document with a caller-chosen id
    pub async fn create<T: Serialize>(&self, collection: &str, id: &str, data: &T) -> Result<Value, DocumentError> {
        let url = self.documents_url(collection);
        let payload = json!({ "documentId": id, "data": data });

        let response = self.authed(self.client.post(&url)).json(&payload).send().await?;
        let response = Self::check(response, id).await?;

        tracing::debug!("Created document {}/{}", collection, id);
        Ok(response.json().await?)
    }

    /// Patch the given attributes of an existing document
    pub async fn update<T: Serialize>(&self, collection: &str, id: &str, data: &T) -> Result<Value, DocumentError> {
        let url = format!("{}/{}", self.documents_url(collection), urlencoding::encode(id));
        let payload = json!({ "data": data });

        let response = self.authed(self.client.patch(&url)).json(&payload).send().await?;
        let response = Self::check(response, id).await?;
        Ok(response.json().await?)
    }

    /// Create, or patch when the id is already taken
    pub async fn upsert<T: Serialize>(&self, collection: &str, id: &str, data: &T) -> Result<Value, DocumentError> {
        match self.create(collection, id, data).await {
            Err(DocumentError::Conflict(_)) => self.update(collection, id, data).await,
            other => other,
        }
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentError> {
        let url = format!("{}/{}", self.documents_url(collection), urlencoding::encode(id));

        let response = self.authed(self.client.delete(&url)).send().await?;
        Self::check(response, id).await?;
        Ok(())
    }
}

/// Decode a document, accepting both flat attributes and a `data` envelope
pub fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, DocumentError> {
    let data = match doc {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_))) => {
            let id = map.remove("$id");
            let mut inner = map.remove("data").unwrap_or(Value::Null);
            if let (Some(id), Value::Object(inner_map)) = (id, &mut inner) {
                inner_map.entry("$id").or_insert(id);
            }
            inner
        }
        other => other,
    };

    serde_json::from_value(data)
        .map_err(|e| DocumentError::InvalidResponse(format!("Failed to parse document: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_json() {
        let parsed = |q: Query| serde_json::from_str::<Value>(&q.to_json()).unwrap();

        assert_eq!(
            parsed(Query::equal("swiperId", "u1")),
            json!({ "method": "equal", "attribute": "swiperId", "values": ["u1"] })
        );
        assert_eq!(parsed(Query::Limit(25)), json!({ "method": "limit", "values": [25] }));
    }

    #[test]
    fn test_decode_envelope_keeps_id() {
        #[derive(serde::Deserialize)]
        struct Doc {
            #[serde(rename = "$id")]
            id: String,
            name: String,
        }

        let flat: Doc = decode(json!({ "$id": "a", "name": "flat" })).unwrap();
        assert_eq!((flat.id.as_str(), flat.name.as_str()), ("a", "flat"));

        let wrapped: Doc = decode(json!({ "$id": "b", "data": { "name": "wrapped" } })).unwrap();
        assert_eq!((wrapped.id.as_str(), wrapped.name.as_str()), ("b", "wrapped"));
    }

    #[test]
    fn test_client_trims_endpoint() {
        let client = DocumentClient::new(&DocumentSettings {
            endpoint: "https://docs.test/v1/".to_string(),
            api_key: "key".to_string(),
            project_id: "project".to_string(),
            database_id: "db".to_string(),
            collections: CollectionSettings::default(),
            page_size: 100,
        })
        .unwrap();

        assert_eq!(
            client.documents_url("posts"),
            "https://docs.test/v1/databases/db/collections/posts/documents"
        );
    }
}
