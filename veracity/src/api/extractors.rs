use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::VeracityError;

/// `axum::Json` whose rejections render as `400 {"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(VeracityError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for VeracityError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> VeracityError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                VeracityError::Validation(format!("Missing '{field}' in request body"))
            } else {
                VeracityError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            VeracityError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            VeracityError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            VeracityError::Internal("Failed to read request body".to_string())
        }
        _ => VeracityError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
