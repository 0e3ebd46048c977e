pub mod capture;
pub mod config;
pub mod prompts;
pub mod service;
pub mod session;
pub mod transport;

pub use capture::{CapturedImage, CAPTURE_MAX_DIM};
pub use config::ServiceConfig;
pub use service::ContentService;
pub use session::{PracticeRound, StorySession};
pub use transport::{GeminiTransport, GenerateRequest, GenerativeTransport};
