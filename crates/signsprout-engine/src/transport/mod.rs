mod gemini;

use signsprout_contracts::error::ServiceError;
use signsprout_contracts::schema::Schema;

use crate::capture::CapturedImage;

pub use gemini::GeminiTransport;

/// One structured completion request: an instruction, an optional inline
/// image, and the shape the answer must take.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub instruction: String,
    pub image: Option<&'a CapturedImage>,
    pub schema: Schema,
}

/// Hosted model endpoint. Returns the raw text payload of the completion;
/// parsing and schema enforcement happen in the content service.
pub trait GenerativeTransport: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, ServiceError>;
}
