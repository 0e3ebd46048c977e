use super::Schema;

/// Activities requested per daily session plan.
pub const PLAN_ACTIVITY_COUNT: usize = 3;

pub fn lesson_plans_schema() -> Schema {
    let plan = Schema::object()
        .property("id", Schema::string())
        .property("title", Schema::string())
        .property("description", Schema::string())
        .property("type", Schema::string().one_of(&["story", "practice", "game"]))
        .property("difficulty", Schema::integer().minimum(0.0))
        .property("estimatedDuration", Schema::integer().minimum(0.0))
        .property("completed", Schema::boolean())
        .require(&[
            "id",
            "title",
            "description",
            "type",
            "difficulty",
            "estimatedDuration",
            "completed",
        ]);
    Schema::array(plan).item_count(PLAN_ACTIVITY_COUNT, PLAN_ACTIVITY_COUNT)
}

pub fn recognition_schema() -> Schema {
    Schema::object()
        .property("isCorrect", Schema::boolean())
        .property("confidence", Schema::number().range(0.0, 1.0))
        .property("feedback", Schema::string())
        .property("detectedSign", Schema::string())
        .require(&["isCorrect", "confidence", "feedback"])
}

pub fn story_segment_schema() -> Schema {
    Schema::object()
        .property("text", Schema::string())
        .property("gloss", Schema::string())
        .property("nextPrompt", Schema::string())
        .require(&["text", "gloss", "nextPrompt"])
}
