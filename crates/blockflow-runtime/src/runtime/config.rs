//! Orchestrator configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default number of rows kept in a block's cached preview.
pub const DEFAULT_PREVIEW_LIMIT: usize = 100;

/// Configuration for the execution orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OrchestratorConfig {
    /// Maximum number of rows fetched into a block's cached result.
    #[builder(default = "DEFAULT_PREVIEW_LIMIT")]
    pub preview_limit: usize,

    /// Whether removing a block drops its derived table or view.
    #[builder(default = "true")]
    pub drop_on_remove: bool,
}

impl OrchestratorConfig {
    /// Returns a builder for the configuration.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }
}

impl OrchestratorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.preview_limit
            && limit == 0
        {
            return Err("preview_limit must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            drop_on_remove: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let config = OrchestratorConfig::builder().build().unwrap();
        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn builder_rejects_zero_preview_limit() {
        let result = OrchestratorConfig::builder().preview_limit(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_overrides() {
        let config = OrchestratorConfig::builder()
            .preview_limit(5usize)
            .drop_on_remove(false)
            .build()
            .unwrap();

        assert_eq!(config.preview_limit, 5);
        assert!(!config.drop_on_remove);
    }
}
