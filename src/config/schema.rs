//! Configuration schema for promptsweep.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so that the JSON
//! config file can use camelCase keys while Rust code uses snake_case
//! fields. Every field has a serde default, so a partial (or empty) config
//! file is always valid.

use serde::{Deserialize, Serialize};

/// Inference backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub default_model: String,
}

fn default_api_base() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            default_model: default_model(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
}

fn default_prompts_dir() -> String {
    "prompts/".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.backend.api_base, "http://localhost:11434");
        assert_eq!(cfg.backend.default_model, "llama3.1");
        assert_eq!(cfg.prompts_dir, "prompts/");
    }

    #[test]
    fn test_camel_case_keys() {
        let cfg: Config = serde_json::from_str(
            r#"{"backend": {"apiBase": "http://gpu-box:11434"}, "promptsDir": "corpus/"}"#,
        )
        .unwrap();
        assert_eq!(cfg.backend.api_base, "http://gpu-box:11434");
        // Unspecified keys fall back field by field.
        assert_eq!(cfg.backend.default_model, "llama3.1");
        assert_eq!(cfg.prompts_dir, "corpus/");
    }

    #[test]
    fn test_roundtrip() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.backend.api_base, cfg.backend.api_base);
        assert_eq!(parsed.prompts_dir, cfg.prompts_dir);
    }
}
