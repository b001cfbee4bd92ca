use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuillError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No readable text found in the image")]
    NoTextFound,

    #[error("OCR extraction failed: {0}")]
    Extraction(String),

    #[error("OCR extraction timed out after {0} seconds")]
    ExtractionTimeout(u64),

    #[error("Note generation failed: {0}")]
    Generation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl QuillError {
    /// Short machine-friendly label used as the `error` field on the wire.
    fn label(&self) -> &'static str {
        match self {
            QuillError::Database(_) => "Database error",
            QuillError::NotFound(_) => "Not found",
            QuillError::Validation(_) => "Validation failed",
            QuillError::NoTextFound => "No text found",
            QuillError::Extraction(_) | QuillError::ExtractionTimeout(_) => {
                "OCR processing failed"
            }
            QuillError::Generation(_) => "AI processing failed",
            QuillError::Json(_) => "Invalid JSON",
            QuillError::Io(_) | QuillError::Internal(_) => "Internal server error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            QuillError::NotFound(_) => StatusCode::NOT_FOUND,
            // Extraction failures are treated as caller-fixable (image quality),
            // generation failures as provider-side.
            QuillError::Validation(_)
            | QuillError::NoTextFound
            | QuillError::Extraction(_)
            | QuillError::ExtractionTimeout(_)
            | QuillError::Json(_) => StatusCode::BAD_REQUEST,
            QuillError::Database(_)
            | QuillError::Generation(_)
            | QuillError::Io(_)
            | QuillError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QuillError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            QuillError::NoTextFound => {
                "Could not extract any readable text from the image. Please ensure the image \
                 contains clear, readable text."
                    .to_string()
            }
            QuillError::Extraction(_) | QuillError::ExtractionTimeout(_) => {
                "Could not extract text from the image. Please ensure the image is clear and \
                 contains readable text."
                    .to_string()
            }
            QuillError::Generation(_) => {
                "Could not generate notes. Please check the API configuration and try again."
                    .to_string()
            }
            other if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // Internal details never reach the client; the real error is logged.
                tracing::error!(error = %other, "internal error mapped to response");
                "An unexpected error occurred while processing the request.".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.label(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, QuillError>;
