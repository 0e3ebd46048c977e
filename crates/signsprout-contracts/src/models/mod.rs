mod registry;
mod selectors;

pub use registry::{Capability, ModelRegistry, ModelSpec, DEFAULT_MODEL};
pub use selectors::{ModelSelection, ModelSelector};
