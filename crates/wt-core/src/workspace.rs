use crate::config::Config;
use crate::error::{Result, WtError};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};

/// One authenticated handle to the remote workspace/document API.
///
/// Every method forwards its arguments and returns the response body
/// verbatim, or surfaces the remote error (status + body) verbatim. No
/// retries, no backoff.
pub struct WorkspaceClient {
    http: Client,
    base_url: String,
    token: String,
}

impl WorkspaceClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Build a client from config (base URL) and environment (token).
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = cfg
            .workspace
            .base_url
            .clone()
            .ok_or(WtError::MissingBaseUrl)?;
        let token = Config::workspace_token()?;
        Ok(Self::new(base_url, token))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, req: RequestBuilder) -> Result<Value> {
        let resp = req.bearer_auth(&self.token).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(WtError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json()?)
    }

    fn get(&self, path: &str) -> Result<Value> {
        self.send(self.http.get(self.url(path)))
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(self.http.post(self.url(path)).json(body))
    }

    fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(self.http.patch(self.url(path)).json(body))
    }

    // -----------------------------------------------------------------------
    // Pass-through helpers
    // -----------------------------------------------------------------------

    /// Single query request against a database.
    pub fn query_database(
        &self,
        database_id: &str,
        filter: Option<&Value>,
        start_cursor: Option<&str>,
    ) -> Result<Value> {
        let mut body = serde_json::Map::new();
        if let Some(f) = filter {
            body.insert("filter".to_string(), f.clone());
        }
        if let Some(c) = start_cursor {
            body.insert("start_cursor".to_string(), Value::String(c.to_string()));
        }
        self.post(
            &format!("/databases/{database_id}/query"),
            &Value::Object(body),
        )
    }

    /// Query a database to exhaustion, following the `has_more` /
    /// `next_cursor` pagination contract, and concatenate `results`.
    pub fn query_database_all(
        &self,
        database_id: &str,
        filter: Option<&Value>,
    ) -> Result<Vec<Value>> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.query_database(database_id, filter, cursor.as_deref())?;
            if let Some(items) = page.get("results").and_then(Value::as_array) {
                results.extend(items.iter().cloned());
            }
            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            if !has_more {
                break;
            }
            cursor = page
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }
        Ok(results)
    }

    pub fn get_page(&self, page_id: &str) -> Result<Value> {
        self.get(&format!("/pages/{page_id}"))
    }

    /// Create a page in a database. `properties` is forwarded untouched.
    pub fn create_page(&self, database_id: &str, properties: Value) -> Result<Value> {
        self.post(
            "/pages",
            &json!({
                "parent": { "database_id": database_id },
                "properties": properties,
            }),
        )
    }

    pub fn update_page(&self, page_id: &str, properties: Value) -> Result<Value> {
        self.patch(
            &format!("/pages/{page_id}"),
            &json!({ "properties": properties }),
        )
    }

    /// Create a database under a parent page. `title` and `properties` are
    /// forwarded untouched.
    pub fn create_database(
        &self,
        parent_page_id: &str,
        title: &str,
        properties: Value,
    ) -> Result<Value> {
        self.post(
            "/databases",
            &json!({
                "parent": { "page_id": parent_page_id },
                "title": [{ "text": { "content": title } }],
                "properties": properties,
            }),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
