use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySegment {
    pub text: String,
    /// Sign-language word order transcription of `text`.
    pub gloss: String,
    pub next_prompt: String,
}

/// Segment a story session shows before the first model call.
pub fn storyteller_greeting() -> StorySegment {
    StorySegment {
        text: "Hi! I'm your storyteller. Are you ready for an adventure?".to_string(),
        gloss: "HELLO I STORYTELLER. ADVENTURE READY?".to_string(),
        next_prompt: "Sign \"READY\" to continue or make a choice.".to_string(),
    }
}
