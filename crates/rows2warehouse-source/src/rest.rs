// REST implementation of the source reader.
//
// Speaks the PostgREST convention: GET {base_url}/{collection}?select=*
// returns the full collection as a JSON array of objects. The API key, if
// configured, travels as both an `apikey` header and a bearer token.

use crate::error::SourceError;
use crate::SourceReader;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rows2warehouse_core::Record;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RestSource {
    client: reqwest::Client,
    base_url: String,
}

impl RestSource {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|_| SourceError::Malformed {
                collection: String::new(),
                message: "api key contains characters not valid in a header".to_string(),
            })?;
            headers.insert("apikey", value);

            let bearer = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
                SourceError::Malformed {
                    collection: String::new(),
                    message: "api key contains characters not valid in a header".to_string(),
                }
            })?;
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SourceReader for RestSource {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, SourceError> {
        let url = format!("{}/{}?select=*", self.base_url, collection);
        tracing::debug!(%url, "fetching source collection");

        let response = self.client.get(&url).send().await.map_err(|source| {
            SourceError::Request { collection: collection.to_string(), source }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                collection: collection.to_string(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| SourceError::Malformed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let rows = body.as_array().ok_or_else(|| SourceError::Malformed {
            collection: collection.to_string(),
            message: "expected a JSON array of rows".to_string(),
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let record = serde_json::from_value::<Record>(row.clone()).map_err(|_| {
                SourceError::Malformed {
                    collection: collection.to_string(),
                    message: format!("row {} is not a JSON object", index),
                }
            })?;
            records.push(record);
        }

        tracing::info!(collection, rows = records.len(), "fetched source collection");
        Ok(records)
    }
}
