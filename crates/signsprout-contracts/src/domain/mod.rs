mod lesson;
mod profile;
mod recognition;
mod story;
mod view;

pub use lesson::{ActivityType, LessonPlan};
pub use profile::{Mood, ProficiencyLevel, UserProfile};
pub use recognition::RecognitionResult;
pub use story::{storyteller_greeting, StorySegment};
pub use view::AppView;
