use thiserror::Error;

use crate::schema::SchemaViolation;

/// Operational failure of a single content request. Never reaches callers of
/// the content service; it only selects and annotates a fallback.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("service returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("model returned no response text")]
    EmptyResponse,
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("response violates declared schema: {0}")]
    Schema(#[from] SchemaViolation),
    #[error("response could not be decoded: {0}")]
    Decode(String),
}
