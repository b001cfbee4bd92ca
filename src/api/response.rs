//! Success envelope for API responses.
//!
//! Every successful endpoint returns:
//!
//! ```json
//! { "success": true, "message": "...", "data": { ... } }
//! ```
//!
//! Errors bypass this envelope; [`crate::error::QuillError`] implements
//! `IntoResponse` and emits `{ "error": "...", "message": "..." }` with the
//! matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            status: StatusCode::OK,
        }
    }

    /// Success with data and a human-readable message (HTTP 200).
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            status: StatusCode::OK,
        }
    }

    /// Resource created (HTTP 201).
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_flag_and_data() {
        let resp = ApiResponse::success(serde_json::json!({"id": "n1"}));
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], "n1");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn message_is_included_when_set() {
        let resp = ApiResponse::success_with_message("Image processed successfully", "payload");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["message"], "Image processed successfully");
        assert_eq!(json["data"], "payload");
    }

    #[test]
    fn created_uses_201() {
        let resp = ApiResponse::created("saved", ());
        assert_eq!(resp.status, StatusCode::CREATED);
    }
}
