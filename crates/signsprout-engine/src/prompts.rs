use signsprout_contracts::domain::UserProfile;
use signsprout_contracts::schema::PLAN_ACTIVITY_COUNT;

pub fn session_plan_instruction(profile: &UserProfile) -> String {
    format!(
        "Create a personalized daily lesson plan for a DHH child named {name}.\n\
Age: {age}. Level: {level}. Current Mood: {mood}.\n\
\n\
The plan should have {count} distinct activities.\n\
Types can be: 'story', 'practice', 'game'.\n\
Keep titles short and descriptions to one child-friendly sentence.\n\
Estimated duration is in minutes.\n\
\n\
Return a JSON array of objects.",
        name = profile.name.trim(),
        age = profile.age,
        level = profile.level,
        mood = profile.mood,
        count = PLAN_ACTIVITY_COUNT,
    )
}

pub fn verify_sign_instruction(target_sign: &str) -> String {
    format!(
        "A child is attempting to perform the ASL sign for \"{target}\".\n\
Analyze the hand shape, position, and orientation.\n\
Is the sign correct? Provide encouraging feedback suitable for a child.\n\
Report confidence as a number between 0 and 1, and the sign you detected if any.\n\
Return JSON.",
        target = target_sign.trim(),
    )
}

pub fn story_segment_instruction(history: &[String], user_action: &str, difficulty: &str) -> String {
    let context = if history.is_empty() {
        "(the story is just starting)".to_string()
    } else {
        history.join("\n")
    };
    format!(
        "Continue the interactive story for a DHH child.\n\
Difficulty: {difficulty}.\n\
Previous context: {context}.\n\
User's last action: {action}.\n\
\n\
Output a JSON object with:\n\
- text: The story sentence (English).\n\
- gloss: The ASL gloss (UPPERCASE, distinct grammar).\n\
- nextPrompt: A question asking the child what to do next.",
        difficulty = difficulty.trim(),
        action = user_action.trim(),
    )
}
