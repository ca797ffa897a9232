//! JSON body extractor whose rejections use the error envelope.
//!
//! `axum::Json` answers a malformed body with a plain-text 400/415/422.
//! Wrapping it routes every rejection through [`AppError`] as a 400.

use axum::extract::{FromRequest, OptionalFromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::http::error::AppError;

/// Drop-in for `axum::Json` on request bodies.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Absent body (no JSON content type) is `None`; a malformed one is still an error.
impl<S, T> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body = <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|Json(value)| ApiJson(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use casework_types::chat::CreateChatRequest;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn reject(req: Request) -> (StatusCode, serde_json::Value) {
        let err = <ApiJson<CreateChatRequest> as FromRequest<()>>::from_request(req, &())
            .await
            .unwrap_err();
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_validation_error() {
        let (status, body) = reject(json_request(r#"{"case_id":"not-a-uuid"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_syntax_error_and_missing_content_type_are_bad_request() {
        let (status, _) = reject(json_request("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = reject(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_optional_body_absent_or_present() {
        let req = Request::builder().method("POST").uri("/").body(Body::empty()).unwrap();
        let body = <ApiJson<CreateChatRequest> as OptionalFromRequest<()>>::from_request(req, &())
            .await
            .unwrap();
        assert!(body.is_none());

        let req = json_request(r#"{"case_id":5}"#);
        let err = <ApiJson<CreateChatRequest> as OptionalFromRequest<()>>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
