//! Envelope response format for all API responses.
//!
//! Every response is wrapped in a consistent envelope:
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [],
//!   "_links": { "self": "..." }
//! }
//! ```
//! Errors use the same envelope; see [`crate::http::error::AppError`].

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;

/// Envelope response wrapping all API data.
///
/// `data` is always present on success, as `null` when the operation has
/// nothing to return (e.g. no chat for a case yet).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,

    pub meta: ApiMeta,

    /// Error list (empty on success).
    pub errors: Vec<ApiErrorDetail>,

    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success envelope timed from `start`.
    pub fn success(data: T, start: Instant) -> Self {
        Self {
            data,
            meta: ApiMeta {
                request_id: uuid::Uuid::now_v7().to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms: start.elapsed().as_millis() as u64,
            },
            errors: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Add a HATEOAS link.
    pub fn with_link(mut self, rel: &str, href: impl Into<String>) -> Self {
        self.links.insert(rel.to_string(), href.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success(serde_json::json!({"url": "https://pay"}), Instant::now())
            .with_link("self", "/api/v1/stripe/create-checkout");
        let value = serde_json::to_value(&resp).unwrap();

        assert_eq!(value["data"]["url"], "https://pay");
        assert_eq!(value["errors"], serde_json::json!([]));
        assert!(value["meta"]["request_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(value["_links"]["self"], "/api/v1/stripe/create-checkout");
    }

    #[test]
    fn test_null_data_is_kept() {
        let resp = ApiResponse::success(Option::<i32>::None, Instant::now());
        let value = serde_json::to_value(&resp).unwrap();

        assert!(value.as_object().unwrap().contains_key("data"));
        assert!(value["data"].is_null());
        assert!(value.get("_links").is_none());
    }
}
