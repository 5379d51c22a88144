use std::sync::Arc;

use reqwest::{header::CONTENT_RANGE, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::BackendConfig;
use crate::error::AppError;
use crate::upstream::{Retry, Upstream};

const SERVICE: &str = "backend";

/// Thin PostgREST client for the hosted relational backend.
#[derive(Clone)]
pub struct RestBackend {
    upstream: Arc<Upstream>,
    base_url: String,
    api_key: String,
    pub(crate) cfg: BackendConfig,
}

impl RestBackend {
    pub fn new(upstream: Arc<Upstream>, cfg: BackendConfig) -> Self {
        Self {
            upstream,
            base_url: format!("{}/rest/v1", cfg.url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
            cfg,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key).bearer_auth(&self.api_key)
    }

    /// `GET /rest/v1/<table>?<filters>`; filters use PostgREST syntax (`eq.x`, `gte.x`).
    #[instrument(skip(self))]
    pub async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let url = self.table_url(table);
        let res = self
            .upstream
            .send(SERVICE, Retry::Idempotent, |c| {
                self.authed(c.get(&url)).query(filters)
            })
            .await?;
        let rows: Vec<T> = res
            .json()
            .await
            .map_err(|e| AppError::malformed(SERVICE, e.to_string()))?;
        debug!(table, rows = rows.len(), "rows fetched");
        Ok(rows)
    }

    /// Inserts one row. Without `returning`, the store answers with no body.
    #[instrument(skip(self, row))]
    pub async fn insert_row<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
        returning: bool,
    ) -> Result<Vec<T>, AppError> {
        let url = self.table_url(table);
        let prefer = if returning {
            "return=representation"
        } else {
            "return=minimal"
        };
        let res = self
            .upstream
            .send(SERVICE, Retry::ConnectOnly, |c| {
                self.authed(c.post(&url)).header("Prefer", prefer).json(row)
            })
            .await?;
        if !returning {
            return Ok(Vec::new());
        }
        res.json()
            .await
            .map_err(|e| AppError::malformed(SERVICE, e.to_string()))
    }

    /// `PATCH` every row matching `filters` and returns the updated rows.
    #[instrument(skip(self, patch))]
    pub async fn update_rows<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        patch: &B,
    ) -> Result<Vec<T>, AppError> {
        let url = self.table_url(table);
        let res = self
            .upstream
            .send(SERVICE, Retry::Idempotent, |c| {
                self.authed(c.patch(&url))
                    .header("Prefer", "return=representation")
                    .query(filters)
                    .json(patch)
            })
            .await?;
        let rows: Vec<T> = res
            .json()
            .await
            .map_err(|e| AppError::malformed(SERVICE, e.to_string()))?;
        debug!(table, rows = rows.len(), "rows updated");
        Ok(rows)
    }

    /// `DELETE` every row matching `filters`; returns how many went.
    #[instrument(skip(self))]
    pub async fn delete_rows(&self, table: &str, filters: &[(&str, String)]) -> Result<usize, AppError> {
        let url = self.table_url(table);
        let res = self
            .upstream
            .send(SERVICE, Retry::Idempotent, |c| {
                self.authed(c.delete(&url))
                    .header("Prefer", "return=representation")
                    .query(filters)
            })
            .await?;
        let rows: Vec<Value> = res
            .json()
            .await
            .map_err(|e| AppError::malformed(SERVICE, e.to_string()))?;
        debug!(table, rows = rows.len(), "rows deleted");
        Ok(rows.len())
    }

    /// Row count from a `HEAD` with `Prefer: count=exact`, read off `Content-Range`.
    #[instrument(skip(self))]
    pub async fn count_rows(&self, table: &str, filters: &[(&str, String)]) -> Result<u64, AppError> {
        let url = self.table_url(table);
        let res = self
            .upstream
            .send(SERVICE, Retry::Idempotent, |c| {
                self.authed(c.head(&url))
                    .header("Prefer", "count=exact")
                    .query(filters)
            })
            .await?;
        let range = res
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        total_from_content_range(range)
            .ok_or_else(|| AppError::malformed(SERVICE, format!("no row count in content-range {range:?}")))
    }
}

/// `0-24/25` and `*/0` both carry the total after the slash.
fn total_from_content_range(range: &str) -> Option<u64> {
    range.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::UpstreamConfig;

    fn backend(server: &MockServer) -> RestBackend {
        let upstream = Upstream::new(&UpstreamConfig {
            timeout_secs: 5,
            connect_timeout_secs: 1,
            max_retries: 2,
            backoff_ms: 1,
        })
        .unwrap();
        RestBackend::new(
            Arc::new(upstream),
            BackendConfig {
                url: format!("{}/", server.uri()),
                api_key: "anon".into(),
                macros_table: "user_macros".into(),
                meal_plans_table: "saved_mps".into(),
            },
        )
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(total_from_content_range("0-24/25"), Some(25));
        assert_eq!(total_from_content_range("*/0"), Some(0));
        assert_eq!(total_from_content_range("0-24/*"), None);
        assert_eq!(total_from_content_range(""), None);
    }

    #[tokio::test]
    async fn select_sends_filters_and_both_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_macros"))
            .and(query_param("username", "eq.alice"))
            .and(query_param("date_added", "gte.2024-03-04"))
            .and(query_param("order", "date_added.asc,meal_name.asc"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
            .expect(1)
            .mount(&server)
            .await;

        let rows: Vec<Value> = backend(&server)
            .select_rows(
                "user_macros",
                &[
                    ("username", "eq.alice".to_string()),
                    ("date_added", "gte.2024-03-04".to_string()),
                    ("order", "date_added.asc,meal_name.asc".to_string()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn insert_asks_for_the_right_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_macros"))
            .and(header("Prefer", "return=minimal"))
            .and(header("apikey", "anon"))
            .and(body_partial_json(json!({ "meal_name": "lunch" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/saved_mps"))
            .and(header("Prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 9, "mp_name": "Cut" }])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&server);
        let none: Vec<Value> = backend
            .insert_row("user_macros", &json!({ "meal_name": "lunch" }), false)
            .await
            .unwrap();
        assert!(none.is_empty());
        let echoed: Vec<Value> = backend
            .insert_row("saved_mps", &json!({ "mp_name": "Cut" }), true)
            .await
            .unwrap();
        assert_eq!(echoed[0]["id"], 9);
    }

    #[tokio::test]
    async fn inserts_are_not_retried_on_a_busy_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend(&server)
            .insert_row::<_, Value>("user_macros", &json!({}), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn update_and_delete_are_scoped_by_id_and_owner() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/saved_mps"))
            .and(query_param("id", "eq.4"))
            .and(query_param("username", "eq.alice"))
            .and(header("Prefer", "return=representation"))
            .and(body_partial_json(json!({ "mp_name": "Bulk" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 4, "mp_name": "Bulk" }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/saved_mps"))
            .and(query_param("id", "eq.4"))
            .and(query_param("username", "eq.alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 4 }])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&server);
        let filters = [("id", "eq.4".to_string()), ("username", "eq.alice".to_string())];
        let updated: Vec<Value> = backend
            .update_rows("saved_mps", &filters, &json!({ "mp_name": "Bulk" }))
            .await
            .unwrap();
        assert_eq!(updated[0]["mp_name"], "Bulk");
        assert_eq!(backend.delete_rows("saved_mps", &filters).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn count_reads_the_exact_total() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/saved_mps"))
            .and(query_param("username", "eq.alice"))
            .and(header("Prefer", "count=exact"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "0-2/3"))
            .expect(1)
            .mount(&server)
            .await;

        let total = backend(&server)
            .count_rows("saved_mps", &[("username", "eq.alice".to_string())])
            .await
            .unwrap();
        assert_eq!(total, 3);
    }
}
