//! API error taxonomy.
//!
//! Validation problems carry field-level detail; extraction failures are
//! recovered at the call site and never reach this type.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON body returned for every error response.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input rejected before any persistence (bad transported JSON,
    /// missing generation fields). Maps to 400.
    #[error("{message}")]
    BadRequest {
        message: String,
        fields: Vec<String>,
    },
    /// Semantic validation failure (unknown status, unknown referenced id,
    /// disallowed transition). Maps to 422.
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("document generation failed: {0}")]
    Generation(String),
    #[error("storage operation failed: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn validation_fields(message: impl Into<String>, fields: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self::BadRequest {
            message: "Missing required fields".to_string(),
            fields,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BadRequest",
            Self::Validation { .. } => "ValidationError",
            Self::NotFound(_) => "NotFound",
            Self::Generation(_) => "GenerationError",
            Self::Storage(_) => "StorageError",
        }
    }

    fn detail_fields(&self) -> Option<Vec<String>> {
        match self {
            Self::BadRequest { fields, .. } | Self::Validation { fields, .. }
                if !fields.is_empty() =>
            {
                Some(fields.clone())
            }
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Generation(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = ErrorResponse::new(self.error_type(), &self.to_string());
        if let Some(fields) = self.detail_fields() {
            body = body.with_fields(fields);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
