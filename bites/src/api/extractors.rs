use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::BitesError;

/// JSON body extractor whose rejections use the v1 error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(BitesError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for BitesError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> BitesError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.to_string();
            if let Some(field) = extract_missing_field(&message) {
                BitesError::Validation(format!("Missing required field: {field}"))
            } else {
                BitesError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            BitesError::Validation(format!("JSON syntax error: {err}"))
        }
        JsonRejection::MissingJsonContentType(_) => {
            BitesError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            BitesError::Internal("Failed to read request body".to_string())
        }
        _ => BitesError::Validation(rejection.to_string()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_missing_field_name() {
        assert_eq!(
            extract_missing_field("Failed to deserialize: missing field `query` at line 1"),
            Some("query")
        );
        assert_eq!(extract_missing_field("expected a string"), None);
    }
}
