use indexmap::IndexMap;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Structured text completions (session plans, story segments).
    Text,
    /// Accepts inline images (sign verification).
    Vision,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Text => "text",
            Capability::Vision => "vision",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub capabilities: Vec<Capability>,
    pub context_window: Option<u64>,
}

impl ModelSpec {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        let trimmed = name.trim();
        self.models
            .get(trimmed)
            .or_else(|| self.models.get(trimmed.trim_start_matches("models/")))
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: Capability) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: Capability) -> Option<ModelSpec> {
        self.get(name)
            .filter(|model| model.supports(capability))
            .cloned()
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();
    let mut insert = |name: &str, capabilities: &[Capability], context_window: Option<u64>| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                capabilities: capabilities.to_vec(),
                context_window,
            },
        );
    };

    let multimodal = [Capability::Text, Capability::Vision];
    insert(DEFAULT_MODEL, &multimodal, Some(1_048_576));
    insert("gemini-2.5-pro", &multimodal, Some(1_048_576));
    insert("gemini-2.5-flash-lite", &multimodal, Some(1_048_576));
    insert("gemini-2.0-flash", &multimodal, Some(1_048_576));
    map
}
