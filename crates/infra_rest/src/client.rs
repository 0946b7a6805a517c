//! PostgREST Query Client
//!
//! This module provides `RestQueryClient`, the `QueryClient` adapter for a
//! PostgREST backend such as the Supabase REST interface.
//!
//! # Request Shapes
//!
//! | Call   | Method   | Query string                              | Prefer                                          |
//! |--------|----------|-------------------------------------------|-------------------------------------------------|
//! | select | `GET`    | `select=*`, `col=eq.v`, `order=`, `limit=` |                                                 |
//! | update | `PATCH`  | `col=eq.v`                                | `return=representation`                         |
//! | insert | `POST`   |                                           | `return=representation`                         |
//! | upsert | `POST`   | `on_conflict=a,b`                         | `resolution=merge-duplicates,return=representation` |
//! | delete | `DELETE` | `col=eq.v`                                | `return=minimal`                                |
//!
//! Every request carries the configured key as both `apikey` and bearer token.
//! Requests are never retried.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use core_kernel::{
    AdapterHealth, DomainPort, Filter, HealthCheckResult, HealthCheckable, PortError,
    QueryClient, Row, SelectQuery,
};

use crate::config::RestConfig;
use crate::error::{status_error, transport_error, ConfigError};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// `QueryClient` backed by a PostgREST HTTP endpoint
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RestQueryClient {
    config: Arc<RestConfig>,
    client: Client,
}

impl RestQueryClient {
    /// Creates a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the key or schema cannot be sent as a
    /// header, or `ConfigError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: RestConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers(&config)?)
            .build()?;

        info!(
            url = %config.url,
            service_role = config.is_service_role,
            timeout_secs = config.timeout.as_secs(),
            "Created REST query client"
        );

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Returns the project base URL
    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.rest_url(), table)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, PortError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, self.config.timeout, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();

        Err(status_error(operation, status, retry_after, body))
    }

    async fn rows(&self, operation: &str, response: Response) -> Result<Vec<Row>, PortError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(operation, self.config.timeout, e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn single_row(
        &self,
        operation: &str,
        response: Response,
        table: &str,
        filters: &[Filter],
    ) -> Result<Row, PortError> {
        self.rows(operation, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::not_found(table, describe(filters)))
    }
}

fn default_headers(config: &RestConfig) -> Result<HeaderMap, ConfigError> {
    let invalid = |variable: &'static str| {
        move |e: reqwest::header::InvalidHeaderValue| ConfigError::Invalid {
            variable,
            message: e.to_string(),
        }
    };

    let mut headers = HeaderMap::new();

    let mut api_key = HeaderValue::from_str(&config.api_key).map_err(invalid("SUPABASE_KEY"))?;
    api_key.set_sensitive(true);
    headers.insert("apikey", api_key);

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(invalid("SUPABASE_KEY"))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    if let Some(schema) = &config.schema {
        let profile = HeaderValue::from_str(schema).map_err(invalid("SUPABASE_SCHEMA"))?;
        headers.insert("Accept-Profile", profile.clone());
        headers.insert("Content-Profile", profile);
    }

    Ok(headers)
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value_text())))
        .collect()
}

fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn describe(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("&")
}

impl DomainPort for RestQueryClient {}

#[async_trait]
impl HealthCheckable for RestQueryClient {
    /// Calls the REST root to verify the backend is reachable and the key is accepted
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let url = format!("{}/", self.config.rest_url());
        let result = self.send("health check", self.client.get(&url)).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) if e.is_transient() => (AdapterHealth::Degraded, Some(e.to_string())),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };

        HealthCheckResult {
            adapter_id: "postgrest-query-client".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl QueryClient for RestQueryClient {
    #[instrument(skip(self, query), fields(table = %table, filters = query.filters.len(), limit = ?query.limit))]
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Row>, PortError> {
        let operation = format!("select {}", table);
        let request = self
            .client
            .get(self.table_url(table))
            .query(&select_params(&query));

        let response = self.send(&operation, request).await?;
        let rows = self.rows(&operation, response).await?;
        debug!(count = rows.len(), "Selected rows");
        Ok(rows)
    }

    #[instrument(skip(self, row, filters), fields(table = %table, filter = %describe(filters)))]
    async fn update(&self, table: &str, row: Row, filters: &[Filter]) -> Result<Row, PortError> {
        let operation = format!("update {}", table);
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&filter_params(filters))
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&row);

        let response = self.send(&operation, request).await?;
        self.single_row(&operation, response, table, filters).await
    }

    #[instrument(skip(self, row), fields(table = %table))]
    async fn insert(&self, table: &str, row: Row) -> Result<Row, PortError> {
        let operation = format!("insert {}", table);
        let request = self
            .client
            .post(self.table_url(table))
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&row);

        let response = self.send(&operation, request).await?;
        self.rows(&operation, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::internal(format!("{} returned no rows", operation)))
    }

    #[instrument(skip(self, row), fields(table = %table, on_conflict = %on_conflict.join(",")))]
    async fn upsert(&self, table: &str, row: Row, on_conflict: &[&str]) -> Result<Row, PortError> {
        let operation = format!("upsert {}", table);
        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict.join(","))])
            .header(PREFER, MERGE_DUPLICATES)
            .json(&row);

        let response = self.send(&operation, request).await?;
        self.rows(&operation, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PortError::internal(format!("{} returned no rows", operation)))
    }

    #[instrument(skip(self, filters), fields(table = %table, filter = %describe(filters)))]
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), PortError> {
        let operation = format!("delete {}", table);
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&filter_params(filters))
            .header(PREFER, RETURN_MINIMAL);

        self.send(&operation, request).await?;
        debug!("Deleted matching rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_params() {
        let query = SelectQuery::new()
            .eq("client_id", "u1")
            .order_desc("date")
            .order_desc("created_at")
            .limit(1);

        assert_eq!(
            select_params(&query),
            vec![
                ("select".to_string(), "*".to_string()),
                ("client_id".to_string(), "eq.u1".to_string()),
                ("order".to_string(), "date.desc,created_at.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_rejects_key_that_cannot_be_a_header() {
        let result = RestQueryClient::new(RestConfig::new("https://abc.supabase.co", "bad\nkey"));
        assert!(matches!(result, Err(ConfigError::Invalid { variable: "SUPABASE_KEY", .. })));
    }

    #[test]
    fn test_table_url() {
        let client = RestQueryClient::new(RestConfig::new("https://abc.supabase.co/", "anon")).unwrap();
        assert_eq!(client.table_url("body_measurements"), "https://abc.supabase.co/rest/v1/body_measurements");
        assert_eq!(client.base_url(), "https://abc.supabase.co");
    }
}
