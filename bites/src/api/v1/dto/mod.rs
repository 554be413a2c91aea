//! v1 API Data Transfer Objects.
//!
//! Request bodies are validated with `validator` before they reach the
//! orchestrators. Responses wrap the orchestrators' own serialisable types.

pub mod chat;
pub mod render;
pub mod search;

pub use chat::*;
pub use render::*;
pub use search::*;

use validator::ValidationErrors;

use crate::error::BitesError;

impl From<ValidationErrors> for BitesError {
    fn from(errors: ValidationErrors) -> Self {
        let fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let detail = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field} {detail}")
            })
            .collect();

        BitesError::Validation(fields.join("; "))
    }
}
