//! Base inference provider interface.

use anyhow::Result;
use async_trait::async_trait;

use crate::sweep::OptionSet;

/// A chunk from a streaming generate response.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Incremental text output from the model.
    Fragment(String),
    /// The stream ended abnormally; no further fragments follow.
    Failed(String),
}

/// Handle to a streaming generate response. The channel closing signals
/// normal completion; the stream is finite and not restartable.
pub struct StreamHandle {
    pub rx: tokio::sync::mpsc::UnboundedReceiver<StreamChunk>,
}

/// Abstract base trait for text-generation backends.
///
/// Implementations should handle the specifics of each backend's API while
/// maintaining a consistent interface. The option set is passed through
/// opaquely; no validation of which keys the backend accepts happens here.
#[async_trait]
pub trait GenerateProvider: Send + Sync {
    /// Start one streaming generate call for `(model, prompt, options)`.
    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        options: &OptionSet,
    ) -> Result<StreamHandle>;

    /// Get the API base URL (for diagnostics). Returns None when unknown.
    fn get_api_base(&self) -> Option<&str> {
        None
    }
}
