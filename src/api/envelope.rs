use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::logic::Rejection;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Uniform response body. `data` and `details` are dropped from the wire
/// entirely when absent, never emitted as null.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            data: None,
            details: None,
        }
    }

    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            data: None,
            details: None,
        }
    }

    pub fn error_with(message: impl Into<String>, details: impl Into<String>) -> Self {
        let details = details.into();
        Self {
            status: Status::Error,
            message: message.into(),
            data: None,
            details: (!details.is_empty()).then_some(details),
        }
    }
}

pub type ErrorReply = (StatusCode, Json<Envelope<()>>);
pub type ApiReply<T> = Result<(StatusCode, Json<Envelope<T>>), ErrorReply>;

/// Default mapping from classified store failures to HTTP replies. Handlers
/// override `NotFound` and `UniqueViolation` with entity-specific wording
/// where the route calls for it.
pub fn translate_store_error(err: StoreError) -> ErrorReply {
    let (status, message) = match &err {
        StoreError::ValueTooLong(_) => (
            StatusCode::BAD_REQUEST,
            "The value provided is too long for a database column.",
        ),
        StoreError::UniqueViolation(_) => (
            StatusCode::CONFLICT,
            "A record with this unique field already exists.",
        ),
        StoreError::ForeignKeyViolation(_) => (
            StatusCode::CONFLICT,
            "Foreign key constraint failed. Ensure the related record exists.",
        ),
        StoreError::NotFound => (
            StatusCode::NOT_FOUND,
            "The specified record could not be found.",
        ),
        StoreError::Other(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "A database error occurred.",
        ),
    };
    (status, Json(Envelope::error_with(message, err.to_string())))
}

pub fn invalid_input(message: impl Into<String>, rejection: &Rejection) -> ErrorReply {
    (
        StatusCode::BAD_REQUEST,
        Json(Envelope::error_with(message, rejection.details())),
    )
}

pub fn not_found(message: impl Into<String>) -> ErrorReply {
    (StatusCode::NOT_FOUND, Json(Envelope::error(message)))
}

pub fn conflict(message: impl Into<String>) -> ErrorReply {
    (StatusCode::CONFLICT, Json(Envelope::error(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    #[test]
    fn absent_fields_are_dropped_from_the_wire() {
        let value = serde_json::to_value(Envelope::<()>::error("Nope")).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "Nope"}));
    }

    #[test]
    fn data_and_details_serialize_when_present() {
        let value =
            serde_json::to_value(Envelope::success_with("Ok", vec![1, 2])).unwrap();
        assert_eq!(
            value,
            json!({"status": "success", "message": "Ok", "data": [1, 2]})
        );

        let value =
            serde_json::to_value(Envelope::<()>::error_with("Bad", "field broke")).unwrap();
        assert_eq!(
            value,
            json!({"status": "error", "message": "Bad", "details": "field broke"})
        );
    }

    #[test]
    fn empty_details_are_treated_as_absent() {
        let envelope = Envelope::<()>::error_with("Bad", "");
        assert!(envelope.details.is_none());
    }

    #[test]
    fn store_errors_map_to_expected_statuses() {
        let cases = [
            (
                StoreError::ValueTooLong("name".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::UniqueViolation("name".into()),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::ForeignKeyViolation("taxonomy_id".into()),
                StatusCode::CONFLICT,
            ),
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (
                StoreError::Other(anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, body) = translate_store_error(err);
            assert_eq!(status, expected);
            assert!(body.0.details.is_some());
        }
    }
}
