use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Debug, Error)]
pub enum DataApiError {
    #[error("Data API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Data API authentication failed: {0}")]
    Unauthorized(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Data API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode Data API response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct FindOneResponse {
    document: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertOneResponse {
    inserted_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    deleted_count: u64,
}

/// JSON-over-HTTP client for the document store's Data API.
///
/// Every call is a POST to `{base_url}/action/{action}` carrying the
/// data source, database and collection alongside the action payload.
pub struct DataApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    data_source: String,
    database: String,
}

impl DataApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.data_api_url.clone(),
            api_key: config.data_api_key.clone(),
            data_source: config.data_source.clone(),
            database: config.database_name.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("api-key", key);
        }
        headers
    }

    async fn action<T>(&self, action: &str, collection: &str, payload: Value) -> Result<T, DataApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/action/{}", self.base_url, action);
        debug!("Data API {} on collection {}", action, collection);

        let mut body = Map::new();
        body.insert("dataSource".to_string(), json!(self.data_source));
        body.insert("database".to_string(), json!(self.database));
        body.insert("collection".to_string(), json!(collection));
        if let Value::Object(extra) = payload {
            body.extend(extra);
        }

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&Value::Object(body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Data API error ({}): {}", status, error_text);

            if error_text.contains("E11000") || error_text.contains("duplicate key") {
                return Err(DataApiError::DuplicateKey(error_text));
            }
            return Err(match status.as_u16() {
                401 | 403 => DataApiError::Unauthorized(error_text),
                code => DataApiError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        let data = response
            .json::<T>()
            .await
            .map_err(|e| DataApiError::Decode(e.to_string()))?;
        Ok(data)
    }

    pub async fn find_one(&self, collection: &str, filter: Value) -> Result<Option<Value>, DataApiError> {
        let response: FindOneResponse = self
            .action("findOne", collection, json!({ "filter": filter }))
            .await?;
        Ok(response.document)
    }

    pub async fn find(&self, collection: &str, filter: Value) -> Result<Vec<Value>, DataApiError> {
        let response: FindResponse = self
            .action("find", collection, json!({ "filter": filter }))
            .await?;
        Ok(response.documents)
    }

    pub async fn find_sorted(
        &self,
        collection: &str,
        filter: Value,
        sort: Value,
        limit: Option<i64>,
    ) -> Result<Vec<Value>, DataApiError> {
        let mut payload = json!({ "filter": filter, "sort": sort });
        if let Some(limit) = limit {
            payload["limit"] = json!(limit);
        }
        let response: FindResponse = self.action("find", collection, payload).await?;
        Ok(response.documents)
    }

    pub async fn insert_one(&self, collection: &str, document: Value) -> Result<String, DataApiError> {
        let response: InsertOneResponse = self
            .action("insertOne", collection, json!({ "document": document }))
            .await?;
        Ok(response.inserted_id)
    }

    pub async fn update_one(
        &self,
        collection: &str,
        filter: Value,
        update: Value,
        upsert: bool,
    ) -> Result<UpdateOutcome, DataApiError> {
        self.action(
            "updateOne",
            collection,
            json!({ "filter": filter, "update": update, "upsert": upsert }),
        )
        .await
    }

    pub async fn delete_one(&self, collection: &str, filter: Value) -> Result<u64, DataApiError> {
        let response: DeleteResponse = self
            .action("deleteOne", collection, json!({ "filter": filter }))
            .await?;
        Ok(response.deleted_count)
    }

    pub async fn delete_many(&self, collection: &str, filter: Value) -> Result<u64, DataApiError> {
        let response: DeleteResponse = self
            .action("deleteMany", collection, json!({ "filter": filter }))
            .await?;
        Ok(response.deleted_count)
    }
}
