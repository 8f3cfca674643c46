//! PostgREST-style remote store.
//!
//! Talks to a hosted Postgres REST gateway: one table per namespace under
//! `{base_url}/rest/v1/{table}`, authenticated with an anon key sent both as
//! `apikey` and as a bearer token. Rows are upserted on the `id` column.

use async_trait::async_trait;
use parlay_core::{RemoteError, RemoteErrorKind};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{RemoteRecord, RemoteStore};

/// Postgres permission-denied error code, surfaced by row level security.
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";
/// PostgREST code for "no rows" on a single-object request.
const PGRST_NO_ROWS: &str = "PGRST116";

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

pub struct RestRemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::transient(format!("request failed: {}", e))
}

/// Map an HTTP failure onto the error kinds the service reacts to.
pub fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let parsed = serde_json::from_str::<PostgrestError>(body).ok();
    let code = parsed.as_ref().and_then(|p| p.code.as_deref());
    let detail = parsed
        .as_ref()
        .and_then(|p| p.message.clone())
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            }
        });

    let kind = match (status, code) {
        (_, Some(PG_INSUFFICIENT_PRIVILEGE)) => RemoteErrorKind::Permission,
        (_, Some(PGRST_NO_ROWS)) => RemoteErrorKind::NotFound,
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => RemoteErrorKind::Permission,
        (StatusCode::NOT_FOUND, _) => RemoteErrorKind::NotFound,
        (StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY, _) => {
            RemoteErrorKind::Validation
        }
        _ => RemoteErrorKind::Transient,
    };

    RemoteError::new(kind, format!("{}: {}", status.as_u16(), detail))
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    async fn upsert(&self, table: &str, record: &RemoteRecord) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[record]);

        let response = self.authed(request).send().await.map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch(&self, table: &str, id: &str) -> Result<Option<RemoteRecord>, RemoteError> {
        let filter = format!("eq.{}", id);
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("id", filter.as_str()), ("select", "*")]);

        let response = self.authed(request).send().await.map_err(transport)?;
        let response = Self::check(response).await?;
        let rows: Vec<RemoteRecord> = response.json().await.map_err(|e| {
            RemoteError::validation(format!("malformed row in {}: {}", table, e))
        })?;
        Ok(rows.into_iter().next())
    }

    async fn list_ids(&self, table: &str) -> Result<Vec<String>, RemoteError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "id")]);

        let response = self.authed(request).send().await.map_err(transport)?;
        let response = Self::check(response).await?;
        let rows: Vec<IdRow> = response.json().await.map_err(|e| {
            RemoteError::validation(format!("malformed id list from {}: {}", table, e))
        })?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn probe(&self, table: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "id"), ("limit", "1")]);

        let response = self.authed(request).send().await.map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RestRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRemoteStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
