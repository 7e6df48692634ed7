//! Centralized provider construction.
//!
//! Provider instances should be created through this module rather than
//! calling `OllamaProvider::new()` directly, so base-URL resolution lives
//! in one place.

use std::sync::Arc;

use crate::config::schema::BackendConfig;
use crate::providers::base::GenerateProvider;
use crate::providers::ollama::OllamaProvider;

/// Create a provider from the backend config section, with an optional
/// CLI override for the base URL. Resolution order: override, config,
/// built-in default.
pub fn from_backend_config(
    cfg: &BackendConfig,
    api_base_override: Option<&str>,
) -> Arc<dyn GenerateProvider> {
    let base = api_base_override.or(Some(cfg.api_base.as_str()));
    Arc::new(OllamaProvider::new(base))
}
