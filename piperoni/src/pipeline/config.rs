//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Default pipeline name used in logs.
pub const DEFAULT_PIPELINE_NAME: &str = "pipe";

/// Configuration for a [`Pipeline`](super::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name used in log records and for embedded runs.
    pub name: String,
    /// Whether unknown names fall back to the function library.
    pub library_fallback: bool,
    /// Whether `parallel`, `which` and `maybe` are installed on creation.
    pub builtin_tags: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PIPELINE_NAME.to_string(),
            library_fallback: true,
            builtin_tags: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a new default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables or disables the function library fallback.
    #[must_use]
    pub fn with_library_fallback(mut self, enabled: bool) -> Self {
        self.library_fallback = enabled;
        self
    }

    /// Enables or disables the built-in tags.
    #[must_use]
    pub fn with_builtin_tags(mut self, enabled: bool) -> Self {
        self.builtin_tags = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::new();
        assert_eq!(config.name, "pipe");
        assert!(config.library_fallback);
        assert!(config.builtin_tags);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_name("ingest")
            .with_library_fallback(false)
            .with_builtin_tags(false);

        assert_eq!(config.name, "ingest");
        assert!(!config.library_fallback);
        assert!(!config.builtin_tags);
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: PipelineConfig =
            serde_json::from_value(serde_json::json!({ "name": "from-file" })).unwrap();
        assert_eq!(config.name, "from-file");
        assert!(config.library_fallback);
    }
}
