use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 3] = [
        ProficiencyLevel::Beginner,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "beginner",
            ProficiencyLevel::Intermediate => "intermediate",
            ProficiencyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| format!("unknown proficiency level '{}'", raw.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Frustrated,
    Tired,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Happy, Mood::Neutral, Mood::Frustrated, Mood::Tired];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Frustrated => "frustrated",
            Mood::Tired => "tired",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mood| mood.as_str() == normalized)
            .ok_or_else(|| format!("unknown mood '{}'", raw.trim()))
    }
}

/// Learner state handed to plan generation. Owned by the caller and never
/// mutated by the content service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub level: ProficiencyLevel,
    pub xp: u64,
    pub streak: u32,
    pub mood: Mood,
    pub last_session: DateTime<Utc>,
}

impl UserProfile {
    pub fn demo() -> Self {
        Self {
            name: "Alex".to_string(),
            age: 7,
            level: ProficiencyLevel::Beginner,
            xp: 1240,
            streak: 12,
            mood: Mood::Happy,
            last_session: Utc::now(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading profile {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid profile JSON in {}", path.display()))
    }

    /// Rank badge shown on the dashboard: beginners are rank 1, everyone else 2.
    pub fn rank(&self) -> u8 {
        if self.level == ProficiencyLevel::Beginner {
            1
        } else {
            2
        }
    }
}
