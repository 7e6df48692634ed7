//! Ollama generate API provider.
//!
//! Talks to `POST <api_base>/api/generate` with `"stream": true`. The
//! response body is newline-delimited JSON; each line carries a `response`
//! text fragment and a `done` flag on the final line.

use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::errors::ProviderError;
use crate::providers::base::{GenerateProvider, StreamChunk, StreamHandle};
use crate::sweep::OptionSet;

pub const DEFAULT_API_BASE: &str = "http://localhost:11434";

pub struct OllamaProvider {
    client: reqwest::Client,
    api_base: String,
}

impl OllamaProvider {
    pub fn new(api_base: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl GenerateProvider for OllamaProvider {
    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        options: &OptionSet,
    ) -> Result<StreamHandle> {
        let url = format!("{}/api/generate", self.api_base);

        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": true,
            "options": options.to_json(),
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(
                "generate API returned status {} (base={}): {}",
                status, self.api_base, error_text
            );
            return Err(ProviderError::ServerError {
                status: status.as_u16(),
                message: error_text,
            }
            .into());
        }

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        // Spawn a task to parse the NDJSON stream. The channel closing marks
        // normal completion; the collector on the other end drains it.
        let byte_stream = response.bytes_stream();
        tokio::spawn(async move {
            parse_ndjson_stream(byte_stream, tx).await;
        });

        Ok(StreamHandle { rx })
    }

    fn get_api_base(&self) -> Option<&str> {
        Some(&self.api_base)
    }
}

/// Parse a newline-delimited JSON byte stream from the generate endpoint.
///
/// Emits `Fragment` for each non-empty `response` field. A transport error
/// or an in-band `error` field emits `Failed` and stops; a line with
/// `done: true` (or the stream ending) completes normally.
async fn parse_ndjson_stream(
    byte_stream: impl futures_util::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin,
    tx: tokio::sync::mpsc::UnboundedSender<StreamChunk>,
) {
    let mut line_buffer = String::new();
    let mut stream = Box::pin(byte_stream);

    while let Some(result) = stream.next().await {
        let bytes = match result {
            Ok(b) => b,
            Err(e) => {
                warn!("generate stream error: {}", e);
                let _ = tx.send(StreamChunk::Failed(e.to_string()));
                return;
            }
        };

        line_buffer.push_str(&String::from_utf8_lossy(&bytes));

        // Process complete lines
        while let Some(newline_pos) = line_buffer.find('\n') {
            let line = line_buffer[..newline_pos]
                .trim_end_matches('\r')
                .to_string();
            line_buffer = line_buffer[newline_pos + 1..].to_string();

            if line.is_empty() {
                continue;
            }

            let chunk: serde_json::Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    debug!("stream parse error (skipping line): {}", e);
                    continue;
                }
            };

            if let Some(message) = chunk.get("error").and_then(|v| v.as_str()) {
                let _ = tx.send(StreamChunk::Failed(message.to_string()));
                return;
            }

            if let Some(text) = chunk.get("response").and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    let _ = tx.send(StreamChunk::Fragment(text.to_string()));
                }
            }

            if chunk.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;

    async fn collect_chunks(lines: Vec<&str>) -> Vec<StreamChunk> {
        let byte_stream = stream::iter(
            lines
                .into_iter()
                .map(|l| Ok::<_, reqwest::Error>(Bytes::from(l.to_string())))
                .collect::<Vec<_>>(),
        );
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        parse_ndjson_stream(byte_stream, tx).await;

        let mut chunks = Vec::new();
        while let Some(c) = rx.recv().await {
            chunks.push(c);
        }
        chunks
    }

    fn fragments(chunks: &[StreamChunk]) -> Vec<&str> {
        chunks
            .iter()
            .filter_map(|c| match c {
                StreamChunk::Fragment(t) => Some(t.as_str()),
                StreamChunk::Failed(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_fragments_arrive_in_order() {
        let chunks = collect_chunks(vec![
            "{\"response\": \"Hel\", \"done\": false}\n",
            "{\"response\": \"lo\", \"done\": false}\n",
            "{\"response\": \"\", \"done\": true}\n",
        ])
        .await;
        assert_eq!(fragments(&chunks), vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_lines_split_across_network_chunks() {
        let chunks = collect_chunks(vec![
            "{\"response\": \"Hel",
            "lo\", \"done\": false}\n{\"respo",
            "nse\": \" world\", \"done\": true}\n",
        ])
        .await;
        assert_eq!(fragments(&chunks), vec!["Hello", " world"]);
    }

    #[tokio::test]
    async fn test_done_stops_the_stream() {
        let chunks = collect_chunks(vec![
            "{\"response\": \"a\", \"done\": true}\n",
            "{\"response\": \"ignored\", \"done\": false}\n",
        ])
        .await;
        assert_eq!(fragments(&chunks), vec!["a"]);
    }

    #[tokio::test]
    async fn test_in_band_error_becomes_failed_chunk() {
        let chunks = collect_chunks(vec!["{\"error\": \"model not found\"}\n"]).await;
        assert_eq!(chunks.len(), 1);
        assert!(matches!(
            &chunks[0],
            StreamChunk::Failed(m) if m == "model not found"
        ));
    }

    #[tokio::test]
    async fn test_unparsable_line_is_skipped() {
        let chunks = collect_chunks(vec![
            "not json\n",
            "{\"response\": \"ok\", \"done\": true}\n",
        ])
        .await;
        assert_eq!(fragments(&chunks), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_no_chunks() {
        let chunks = collect_chunks(vec![]).await;
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let provider = OllamaProvider::new(Some("http://localhost:11434/"));
        assert_eq!(provider.get_api_base(), Some("http://localhost:11434"));
    }

    #[test]
    fn test_default_api_base() {
        let provider = OllamaProvider::new(None);
        assert_eq!(provider.get_api_base(), Some(DEFAULT_API_BASE));
    }
}
