//! Turning raw backend text into place records and narrative.

mod response;
mod validator;

pub use response::{decode, find_fenced_json, FencedBlock};
pub use validator::{normalize, normalize_all};
