//! HTTP gateway to the JADX plugin.
//!
//! One attempt per request, bounded by the client timeout. Responses are
//! normalized into [`Payload`]; failures into [`ToolError`].

use super::pages::{self, Envelope, FULL_PAGE_SIZE};
use super::{Endpoint, Params};
use crate::config::BackendConfig;
use crate::error::ToolError;
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Field names whose string value carries the whole text of a response.
const TEXT_FIELDS: &[&str] = &["code", "content", "source", "smali", "text", "response"];

/// A raw backend response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// How a payload is split into pageable units.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Text, split into lines.
    Text(String),
    /// An ordered list of structured records.
    Records(Vec<Value>),
    /// Nothing pageable; returned as-is.
    Inline(Value),
}

impl Payload {
    fn from_body(body: String) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(body),
        }
    }

    /// Backend-reported failure carried in a successful response.
    fn error_message(&self) -> Option<&str> {
        match self {
            Payload::Json(Value::Object(map)) => map.get("error").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(v) => v,
            Payload::Text(s) => Value::String(s),
        }
    }

    /// Decide the pageable units of this payload.
    ///
    /// Arrays are records. Objects expose their text through one of
    /// [`TEXT_FIELDS`], directly or nested (`{"code": {"content": ...}}`),
    /// or else their records through the first array-valued field. A bare
    /// JSON string is text. Anything else stays inline.
    pub fn shape(self) -> Shape {
        match self {
            Payload::Text(s) => Shape::Text(s),
            Payload::Json(Value::String(s)) => Shape::Text(s),
            Payload::Json(Value::Array(items)) => Shape::Records(items),
            Payload::Json(Value::Object(mut map)) => {
                if let Some(text) = take_text(&mut map) {
                    return Shape::Text(text);
                }
                let array_field = map
                    .iter()
                    .find(|(_, v)| v.is_array())
                    .map(|(k, _)| k.clone());
                match array_field.and_then(|k| map.remove(&k)) {
                    Some(Value::Array(items)) => Shape::Records(items),
                    _ => Shape::Inline(Value::Object(map)),
                }
            }
            Payload::Json(other) => Shape::Inline(other),
        }
    }
}

fn carries_text(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(map) => TEXT_FIELDS
            .iter()
            .any(|f| map.get(*f).is_some_and(carries_text)),
        _ => false,
    }
}

fn take_text(map: &mut Map<String, Value>) -> Option<String> {
    let field = TEXT_FIELDS
        .iter()
        .find(|f| map.get(**f).is_some_and(carries_text))?;
    match map.remove(*field)? {
        Value::String(text) => Some(text),
        Value::Object(mut inner) => take_text(&mut inner),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct BackendGateway {
    client: Client,
    base_url: String,
}

impl BackendGateway {
    pub fn new(config: &BackendConfig) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ToolError::Unexpected(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// GET with query parameters.
    pub async fn fetch(&self, endpoint: Endpoint, params: &Params) -> Result<Payload, ToolError> {
        debug!(%endpoint, params = ?params.as_pairs(), "Backend fetch");
        let response = self
            .client
            .get(self.url(endpoint))
            .query(params.as_pairs())
            .send()
            .await
            .map_err(|e| log_failure(endpoint, e.into()))?;
        read_response(response)
            .await
            .map_err(|e| log_failure(endpoint, e))
    }

    /// POST with a form-encoded body. Never retried.
    pub async fn submit(&self, endpoint: Endpoint, params: &Params) -> Result<Payload, ToolError> {
        debug!(%endpoint, params = ?params.as_pairs(), "Backend submit");
        let response = self
            .client
            .post(self.url(endpoint))
            .form(params.as_pairs())
            .send()
            .await
            .map_err(|e| log_failure(endpoint, e.into()))?;
        read_response(response)
            .await
            .map_err(|e| log_failure(endpoint, e))
    }

    /// GET a complete result.
    ///
    /// Routes that page on their own are asked for everything in one page.
    /// If the backend still answers with a partial page, the remaining pages
    /// are fetched in order and joined. The joined result replaces the body.
    pub async fn fetch_all(&self, endpoint: Endpoint, params: &Params) -> Result<Payload, ToolError> {
        let Some(unit) = endpoint.paging() else {
            let payload = self.fetch(endpoint, params).await?;
            if let Payload::Json(body) = &payload {
                if Envelope::find(body).is_some_and(|e| e.has_more()) {
                    warn!(%endpoint, "Backend returned only the first page of its result");
                }
            }
            return Ok(payload);
        };

        let mut params = params.clone();
        params
            .set_num("page_index", 1)
            .set_num("page_size", FULL_PAGE_SIZE);
        let payload = self.fetch(endpoint, &params).await?;
        let Some(first) = (match &payload {
            Payload::Json(body) => Envelope::find(body),
            Payload::Text(_) => None,
        }) else {
            return Ok(payload);
        };

        let Envelope {
            mut items,
            current_page,
            total_pages,
            page_size,
        } = first;
        if current_page < total_pages {
            let page_size = page_size.map_or(FULL_PAGE_SIZE, |n| n as i64);
            params.set_num("page_size", page_size);
            for page in current_page + 1..=total_pages {
                params.set("page_index", page.to_string());
                let next = self.fetch(endpoint, &params).await?;
                let envelope = match &next {
                    Payload::Json(body) => Envelope::find(body),
                    Payload::Text(_) => None,
                }
                .ok_or_else(|| {
                    log_failure(
                        endpoint,
                        ToolError::Unexpected(format!("page {page} of {endpoint} is not paged")),
                    )
                })?;
                items.extend(envelope.items);
            }
            debug!(%endpoint, total_pages, "Joined backend pages");
        }
        Ok(Payload::Json(pages::assemble(unit, items)))
    }

    pub async fn health(&self) -> Result<Payload, ToolError> {
        self.fetch(Endpoint::Health, &Params::new()).await
    }
}

fn log_failure(endpoint: Endpoint, err: ToolError) -> ToolError {
    warn!(%endpoint, category = err.category().as_str(), error = %err, "Backend call failed");
    err
}

async fn read_response(response: Response) -> Result<Payload, ToolError> {
    let status = response.status();
    let body = response.text().await?;
    let payload = Payload::from_body(body);

    if !status.is_success() {
        let message = match (&payload, payload.error_message()) {
            (_, Some(msg)) => msg.to_string(),
            (Payload::Text(text), None) if !text.is_empty() => text.clone(),
            (Payload::Json(value), None) => value.to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
        };
        return Err(ToolError::Backend {
            status: Some(status.as_u16()),
            message,
        });
    }

    if let Some(msg) = payload.error_message() {
        return Err(ToolError::Backend {
            status: None,
            message: msg.to_string(),
        });
    }

    Ok(payload)
}
