use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::listing::Pagination;

pub const CODE_SUCCESS: i32 = 1;
pub const CODE_ERROR: i32 = 0;

/// Response wrapper shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: i32,
    pub mess: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: CODE_SUCCESS,
            mess: "success".to_string(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn success_paged(data: T, pagination: Pagination) -> Self {
        Self {
            code: CODE_SUCCESS,
            mess: "success".to_string(),
            data: Some(data),
            pagination: Some(pagination),
        }
    }

}

impl Envelope<()> {
    /// Data-less acknowledgement, inferred from the handler's return type.
    pub fn message(mess: &str) -> Envelope<()> {
        Envelope {
            code: CODE_SUCCESS,
            mess: mess.to_string(),
            data: None,
            pagination: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(e) => {
                error!("Internal error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Envelope::<()> {
            code: CODE_ERROR,
            mess: self.to_string(),
            data: None,
            pagination: None,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_code_one() {
        let env = Envelope::success(vec![1, 2, 3]);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["code"], 1);
        assert_eq!(json["mess"], "success");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn message_envelope_needs_no_type_annotation() {
        let env = Envelope::message("status updated");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["code"], 1);
        assert_eq!(json["mess"], "status updated");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn error_envelope_carries_code_zero() {
        let err = ApiError::NotFound("accommodation");
        let env = Envelope::<()> {
            code: CODE_ERROR,
            mess: err.to_string(),
            data: None,
            pagination: None,
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["mess"], "accommodation not found");
    }
}
