use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    pub is_correct: bool,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_sign: Option<String>,
}
