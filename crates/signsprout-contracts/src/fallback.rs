//! Fixed substitutes served when the model is unconfigured or unusable.
//! Every value here satisfies the same schema as the live response it replaces.

use crate::domain::{ActivityType, LessonPlan, RecognitionResult, StorySegment};

pub const MOCK_CONFIDENCE: f64 = 0.85;

pub fn mock_lesson_plans() -> Vec<LessonPlan> {
    vec![
        LessonPlan {
            id: "1".to_string(),
            title: "Morning Adventure".to_string(),
            description: "Learn animal signs with a story about a zoo.".to_string(),
            activity: ActivityType::Story,
            difficulty: 1,
            estimated_duration: 10,
            completed: false,
        },
        LessonPlan {
            id: "2".to_string(),
            title: "Finger Spelling Dash".to_string(),
            description: "Quick fire A-Z practice.".to_string(),
            activity: ActivityType::Practice,
            difficulty: 2,
            estimated_duration: 5,
            completed: false,
        },
        LessonPlan {
            id: "3".to_string(),
            title: "Emotion Check".to_string(),
            description: "Expressing feelings through signs.".to_string(),
            activity: ActivityType::Game,
            difficulty: 1,
            estimated_duration: 5,
            completed: false,
        },
    ]
}

/// Optimistic result used while no credential is configured.
pub fn mock_recognition(target_sign: &str) -> RecognitionResult {
    RecognitionResult {
        is_correct: true,
        confidence: MOCK_CONFIDENCE,
        feedback: "Great job! (Mock)".to_string(),
        detected_sign: Some(target_sign.to_string()),
    }
}

pub fn failed_recognition() -> RecognitionResult {
    RecognitionResult {
        is_correct: false,
        confidence: 0.0,
        feedback: "I couldn't quite see that. Can you try again?".to_string(),
        detected_sign: None,
    }
}

pub fn opening_story_segment() -> StorySegment {
    StorySegment {
        text: "Once upon a time, there was a brave little rabbit.".to_string(),
        gloss: "LONG-AGO RABBIT BRAVE SMALL EXIST.".to_string(),
        next_prompt: "What should the rabbit do?".to_string(),
    }
}

pub fn connection_lost_story_segment() -> StorySegment {
    StorySegment {
        text: "The connection was lost, but the adventure continues!".to_string(),
        gloss: "CONNECTION LOST ADVENTURE CONTINUE".to_string(),
        next_prompt: "Try again?".to_string(),
    }
}
