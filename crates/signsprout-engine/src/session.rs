use signsprout_contracts::domain::{storyteller_greeting, RecognitionResult, StorySegment};
use signsprout_contracts::outcome::Outcome;

use crate::capture::CapturedImage;
use crate::service::ContentService;

pub const PRACTICE_WORDS: &[&str] = &["APPLE", "CAT", "FAMILY", "FRIEND", "PLAY"];
pub const DEFAULT_STORY_ACTION: &str = "User smiled and nodded";
pub const DEFAULT_STORY_DIFFICULTY: &str = "beginner";

/// Running interactive story.
///
/// Starts at the storyteller greeting. Each `advance` sends the history
/// accumulated so far, then moves the segment on screen into the history and
/// shows the new one.
#[derive(Debug, Clone)]
pub struct StorySession {
    history: Vec<String>,
    current: StorySegment,
    difficulty: String,
}

impl StorySession {
    pub fn new(difficulty: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            current: storyteller_greeting(),
            difficulty: difficulty.into(),
        }
    }

    pub fn current(&self) -> &StorySegment {
        &self.current
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    pub fn advance(&mut self, service: &ContentService, user_action: &str) -> Outcome<StorySegment> {
        let outcome = service.generate_story_segment(&self.history, user_action, &self.difficulty);
        let previous = std::mem::replace(&mut self.current, outcome.value().clone());
        self.history.push(previous.text);
        outcome
    }
}

impl Default for StorySession {
    fn default() -> Self {
        Self::new(DEFAULT_STORY_DIFFICULTY)
    }
}

/// Practice target tracking. The next word is only offered once the current
/// one was signed correctly; words rotate in list order.
#[derive(Debug, Clone)]
pub struct PracticeRound {
    words: Vec<String>,
    index: usize,
    target: String,
    last_result: Option<RecognitionResult>,
}

impl PracticeRound {
    pub fn new() -> Self {
        Self::with_words(PRACTICE_WORDS.iter().map(|word| word.to_string()).collect())
    }

    /// Empty lists fall back to the built-in words.
    pub fn with_words(words: Vec<String>) -> Self {
        let words = words
            .into_iter()
            .map(|word| word.trim().to_ascii_uppercase())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>();
        if words.is_empty() {
            return Self::new();
        }
        let target = words[0].clone();
        Self {
            words,
            index: 0,
            target,
            last_result: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn last_result(&self) -> Option<&RecognitionResult> {
        self.last_result.as_ref()
    }

    /// Practise a specific word. Words from the list also move the rotation.
    pub fn set_target(&mut self, word: &str) {
        let word = word.trim().to_ascii_uppercase();
        if let Some(index) = self.words.iter().position(|candidate| *candidate == word) {
            self.index = index;
        }
        self.target = word;
        self.last_result = None;
    }

    pub fn attempt(
        &mut self,
        service: &ContentService,
        image: &CapturedImage,
    ) -> Outcome<RecognitionResult> {
        let outcome = service.verify_sign(image, &self.target);
        self.record(outcome.value().clone());
        outcome
    }

    pub fn record(&mut self, result: RecognitionResult) {
        self.last_result = Some(result);
    }

    pub fn can_advance(&self) -> bool {
        self.last_result
            .as_ref()
            .is_some_and(|result| result.is_correct)
    }

    pub fn next_word(&mut self) -> Option<&str> {
        if !self.can_advance() {
            return None;
        }
        self.index = (self.index + 1) % self.words.len();
        self.target = self.words[self.index].clone();
        self.last_result = None;
        Some(&self.target)
    }
}

impl Default for PracticeRound {
    fn default() -> Self {
        Self::new()
    }
}
