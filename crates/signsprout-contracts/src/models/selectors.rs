use super::registry::{Capability, ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_default(),
        }
    }

    /// Resolves `requested` for `capability`, falling back to the first capable
    /// model in registry order with a reason the caller can log.
    pub fn select(
        &self,
        requested: Option<&str>,
        capability: Capability,
    ) -> Result<ModelSelection, String> {
        let requested = requested.map(str::trim).filter(|value| !value.is_empty());
        let fallback_reason = match requested {
            Some(name) => {
                if let Some(model) = self.registry.ensure(name, capability) {
                    return Ok(ModelSelection {
                        model,
                        requested: Some(name.to_string()),
                        fallback_reason: None,
                    });
                }
                format!(
                    "Requested model '{name}' unavailable for capability '{}'.",
                    capability.as_str()
                )
            }
            None => "No model specified; using default.".to_string(),
        };

        let Some(model) = self.registry.by_capability(capability).into_iter().next() else {
            return Err(format!(
                "No models available for capability '{}'.",
                capability.as_str()
            ));
        };
        Ok(ModelSelection {
            model,
            requested: requested.map(str::to_string),
            fallback_reason: Some(fallback_reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::models::DEFAULT_MODEL;

    fn text_only(name: &str) -> ModelSpec {
        ModelSpec {
            name: name.to_string(),
            capabilities: vec![Capability::Text],
            context_window: None,
        }
    }

    #[test]
    fn known_model_is_selected_without_reason() {
        let selection = ModelSelector::default()
            .select(Some("gemini-2.5-pro"), Capability::Vision)
            .unwrap();
        assert_eq!(selection.model.name, "gemini-2.5-pro");
        assert_eq!(selection.fallback_reason, None);
    }

    #[test]
    fn resource_style_model_names_resolve() {
        let selection = ModelSelector::default()
            .select(Some("models/gemini-2.0-flash"), Capability::Text)
            .unwrap();
        assert_eq!(selection.model.name, "gemini-2.0-flash");
    }

    #[test]
    fn unknown_model_falls_back_to_default_with_reason() {
        let selection = ModelSelector::default()
            .select(Some("gemini-9-ultra"), Capability::Vision)
            .unwrap();
        assert_eq!(selection.model.name, DEFAULT_MODEL);
        assert_eq!(selection.requested.as_deref(), Some("gemini-9-ultra"));
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested model 'gemini-9-ultra' unavailable for capability 'vision'.")
        );
    }

    #[test]
    fn blank_request_uses_default() {
        let selection = ModelSelector::default()
            .select(Some("  "), Capability::Text)
            .unwrap();
        assert_eq!(selection.model.name, DEFAULT_MODEL);
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("No model specified; using default.")
        );
    }

    #[test]
    fn registry_without_capable_models_errors() {
        let mut models = IndexMap::new();
        models.insert("text-only".to_string(), text_only("text-only"));
        let err = ModelSelector::new(Some(ModelRegistry::new(Some(models))))
            .select(Some("text-only"), Capability::Vision)
            .unwrap_err();
        assert_eq!(err, "No models available for capability 'vision'.");
    }
}
