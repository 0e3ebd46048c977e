use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppView {
    Dashboard,
    StoryMode,
    PracticeMode,
    ParentDashboard,
    Settings,
}

impl AppView {
    pub const ALL: [AppView; 5] = [
        AppView::Dashboard,
        AppView::StoryMode,
        AppView::PracticeMode,
        AppView::ParentDashboard,
        AppView::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppView::Dashboard => "dashboard",
            AppView::StoryMode => "story",
            AppView::PracticeMode => "practice",
            AppView::ParentDashboard => "parent",
            AppView::Settings => "settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AppView::Dashboard => "Dashboard",
            AppView::StoryMode => "Story Time",
            AppView::PracticeMode => "Practice",
            AppView::ParentDashboard => "Parent Portal",
            AppView::Settings => "Settings",
        }
    }
}

impl fmt::Display for AppView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppView {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let view = match normalized.as_str() {
            "dashboard" | "home" => AppView::Dashboard,
            "story" | "story_mode" => AppView::StoryMode,
            "practice" | "practice_mode" => AppView::PracticeMode,
            "parent" | "parent_dashboard" => AppView::ParentDashboard,
            "settings" => AppView::Settings,
            _ => return Err(format!("unknown view '{}'", raw.trim())),
        };
        Ok(view)
    }
}
