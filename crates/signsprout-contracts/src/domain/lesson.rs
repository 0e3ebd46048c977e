use std::fmt;

use serde::{Deserialize, Serialize};

use super::AppView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Story,
    Practice,
    Game,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [
        ActivityType::Story,
        ActivityType::Practice,
        ActivityType::Game,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Story => "story",
            ActivityType::Practice => "practice",
            ActivityType::Game => "game",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub activity: ActivityType,
    pub difficulty: u32,
    /// Minutes.
    pub estimated_duration: u32,
    pub completed: bool,
}

impl LessonPlan {
    /// View the dashboard opens when this activity is picked. Games have no
    /// dedicated view yet.
    pub fn target_view(&self) -> Option<AppView> {
        match self.activity {
            ActivityType::Story => Some(AppView::StoryMode),
            ActivityType::Practice => Some(AppView::PracticeMode),
            ActivityType::Game => None,
        }
    }
}
