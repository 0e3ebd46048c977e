use serde::de::DeserializeOwned;
use serde_json::json;
use signsprout_contracts::domain::{LessonPlan, RecognitionResult, StorySegment, UserProfile};
use signsprout_contracts::events::{ContentEvent, EventKind, EventWriter};
use signsprout_contracts::fallback;
use signsprout_contracts::models::{Capability, ModelSelector};
use signsprout_contracts::outcome::{settle, Attempt, FallbackCause, Outcome};
use signsprout_contracts::schema::{
    decode_conforming, lesson_plans_schema, recognition_schema, story_segment_schema, Schema,
};
use tracing::{debug, info, warn};

use crate::capture::CapturedImage;
use crate::config::ServiceConfig;
use crate::prompts;
use crate::transport::{GeminiTransport, GenerateRequest, GenerativeTransport};

/// Turns application requests into schema-constrained model completions.
///
/// Every operation returns a value: a live result when the transport answers
/// with a conforming payload, otherwise the operation's fixed fallback. Errors
/// are logged and recorded in the event log, never returned. Each call makes
/// at most one request and never retries.
pub struct ContentService {
    transport: Option<Box<dyn GenerativeTransport>>,
    model: String,
    selector: ModelSelector,
    events: Option<EventWriter>,
}

impl ContentService {
    pub fn new(transport: Option<Box<dyn GenerativeTransport>>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
            selector: ModelSelector::default(),
            events: None,
        }
    }

    pub fn unconfigured() -> Self {
        Self::new(None, signsprout_contracts::models::DEFAULT_MODEL)
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        let transport = GeminiTransport::from_config(config)
            .map(|transport| Box::new(transport) as Box<dyn GenerativeTransport>);
        if transport.is_none() {
            debug!("no API credential configured; content service runs on fallbacks");
        }
        let mut service = Self::new(transport, config.model.as_str());
        service.select_model(&config.model);
        if let Some(path) = config.events_path.as_ref() {
            service = service.with_events(EventWriter::for_new_session(path));
        }
        service
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub fn transport_name(&self) -> Option<&str> {
        self.transport.as_deref().map(|transport| transport.name())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn events(&self) -> Option<&EventWriter> {
        self.events.as_ref()
    }

    /// Switches model. Unknown names resolve to the default and the reason is
    /// returned (and logged). Every operation shares one model, so it must
    /// accept images.
    pub fn select_model(&mut self, requested: &str) -> Option<String> {
        match self.selector.select(Some(requested), Capability::Vision) {
            Ok(selection) => {
                if let Some(reason) = selection.fallback_reason.as_deref() {
                    warn!(requested, selected = %selection.model.name, "{reason}");
                }
                self.model = selection.model.name;
                selection.fallback_reason
            }
            Err(reason) => {
                warn!(requested, "{reason}");
                Some(reason)
            }
        }
    }

    pub fn generate_session_plan(&self, profile: &UserProfile) -> Outcome<Vec<LessonPlan>> {
        let attempt = self.request(
            prompts::session_plan_instruction(profile),
            None,
            lesson_plans_schema(),
        );
        let outcome = settle(
            attempt,
            fallback::mock_lesson_plans,
            fallback::mock_lesson_plans,
        );
        let activities = outcome
            .value()
            .iter()
            .map(|plan| plan.activity.as_str())
            .collect::<Vec<_>>();
        let event = ContentEvent::from_outcome(EventKind::SessionPlan, &self.model, &outcome)
            .with_detail("level", profile.level.as_str())
            .with_detail("mood", profile.mood.as_str())
            .with_detail("activities", activities);
        self.finish(&outcome, event);
        outcome
    }

    /// Judges one captured frame against `target_sign`. Surrounding
    /// whitespace in the target is ignored by the prompt and the fallbacks.
    pub fn verify_sign(
        &self,
        image: &CapturedImage,
        target_sign: &str,
    ) -> Outcome<RecognitionResult> {
        let target_sign = target_sign.trim();
        let attempt = self.request(
            prompts::verify_sign_instruction(target_sign),
            Some(image),
            recognition_schema(),
        );
        let outcome = settle(
            attempt,
            || fallback::mock_recognition(target_sign),
            fallback::failed_recognition,
        );
        let result = outcome.value();
        let event = ContentEvent::from_outcome(EventKind::SignVerification, &self.model, &outcome)
            .with_detail("target_sign", target_sign)
            .with_detail("image_mime", image.mime_type.as_str())
            .with_detail("image_bytes", image.bytes.len())
            .with_detail("is_correct", result.is_correct)
            .with_detail("confidence", result.confidence)
            .with_detail("detected_sign", json!(result.detected_sign));
        self.finish(&outcome, event);
        outcome
    }

    pub fn generate_story_segment(
        &self,
        history: &[String],
        user_action: &str,
        difficulty: &str,
    ) -> Outcome<StorySegment> {
        let attempt = self.request(
            prompts::story_segment_instruction(history, user_action, difficulty),
            None,
            story_segment_schema(),
        );
        let outcome = settle(
            attempt,
            fallback::opening_story_segment,
            fallback::connection_lost_story_segment,
        );
        let event = ContentEvent::from_outcome(EventKind::StorySegment, &self.model, &outcome)
            .with_detail("history_len", history.len())
            .with_detail("difficulty", difficulty)
            .with_detail("gloss", outcome.value().gloss.as_str());
        self.finish(&outcome, event);
        outcome
    }

    fn request<T: DeserializeOwned>(
        &self,
        instruction: String,
        image: Option<&CapturedImage>,
        schema: Schema,
    ) -> Attempt<T> {
        let Some(transport) = self.transport.as_deref() else {
            return Attempt::Unconfigured;
        };
        let request = GenerateRequest {
            model: &self.model,
            instruction,
            image,
            schema,
        };
        let result = transport
            .generate(&request)
            .and_then(|text| decode_conforming(&text, &request.schema));
        Attempt::Completed(result)
    }

    fn finish<T>(&self, outcome: &Outcome<T>, event: ContentEvent) {
        let operation = event.kind.as_str();
        match outcome.cause() {
            None => info!(operation, model = %self.model, "content request succeeded"),
            Some(FallbackCause::Unconfigured) => {
                debug!(operation, "no API credential; serving fallback")
            }
            Some(FallbackCause::Failed(reason)) => warn!(
                operation,
                model = %self.model,
                error = %reason,
                "content request failed; serving fallback"
            ),
        }

        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.record(&event) {
            warn!(
                error = %err,
                path = %events.path().display(),
                "failed to append content event"
            );
        }
    }
}
