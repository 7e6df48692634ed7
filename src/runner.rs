//! Sweep run orchestration.
//!
//! Drives prompt groups × prompts × option sets strictly sequentially: one
//! streaming inference call at a time, each result persisted before the next
//! call is issued. The progress trace (prompt text, option set, live
//! response, `---` separator) goes to stdout; diagnostics go through
//! `tracing`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::warn;

use crate::corpus::PromptGroup;
use crate::errors::ProviderError;
use crate::providers::base::{GenerateProvider, StreamChunk, StreamHandle};
use crate::results::{artifact_path, write_artifact, ResultsRoot};
use crate::sweep::SweepPoint;

/// What to do when a backend call fails mid-sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// First failed call ends the sweep (default).
    Abort,
    /// Log the failure and move on to the next option set / prompt.
    Continue,
}

/// Per-invocation run parameters.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub model: String,
    /// When set, only the group with this exact name is run; other groups
    /// are skipped entirely, including their subdirectory creation.
    pub group_filter: Option<String>,
    pub error_policy: ErrorPolicy,
    /// Parent directory the results root is created under.
    pub output_dir: PathBuf,
}

impl RunSpec {
    pub fn new(model: &str, output_dir: &Path) -> Self {
        Self {
            model: model.to_string(),
            group_filter: None,
            error_policy: ErrorPolicy::Abort,
            output_dir: output_dir.to_path_buf(),
        }
    }
}

/// Execute the sweep. Returns the results root path.
///
/// The results root is created before any group is processed; creation
/// failure (including the directory already existing) is fatal and nothing
/// runs. Artifacts written before a later failure are left intact.
pub async fn run_sweep(
    provider: &dyn GenerateProvider,
    groups: &[PromptGroup],
    points: &[SweepPoint],
    spec: &RunSpec,
) -> Result<PathBuf> {
    let root = ResultsRoot::create(&spec.output_dir)?;

    for group in groups {
        if let Some(ref filter) = spec.group_filter {
            if *filter != group.name {
                continue;
            }
        }

        let group_dir = root.create_group_dir(&group.name)?;

        for (prompt_id, prompt_text) in &group.prompts {
            println!("Prompt: {prompt_text}");

            for (index, point) in points.iter().enumerate() {
                println!();
                println!("{}", point.options);

                let path = artifact_path(&group_dir, prompt_id, point, index);
                match run_one(provider, &spec.model, prompt_text, point).await {
                    Ok(response) => {
                        write_artifact(&path, prompt_text, &point.options, &response)?;
                    }
                    Err(e) => {
                        let e = e.context(format!(
                            "inference call failed for {}",
                            path.display()
                        ));
                        match spec.error_policy {
                            ErrorPolicy::Abort => return Err(e),
                            ErrorPolicy::Continue => warn!("{:#}", e),
                        }
                    }
                }
            }

            println!();
            println!("---");
            println!();
        }
    }

    Ok(root.into_path())
}

async fn run_one(
    provider: &dyn GenerateProvider,
    model: &str,
    prompt_text: &str,
    point: &SweepPoint,
) -> Result<String> {
    let handle = provider
        .generate_stream(model, prompt_text, &point.options)
        .await?;
    collect_stream(handle).await
}

/// Drain one fragment stream to completion, echoing each fragment to stdout
/// (no newline) and concatenating in arrival order.
///
/// The channel closing signals normal completion; an empty stream yields an
/// empty string. There is no timeout: a hung backend call blocks here.
pub async fn collect_stream(mut handle: StreamHandle) -> Result<String> {
    let mut full_response = String::new();

    while let Some(chunk) = handle.rx.recv().await {
        match chunk {
            StreamChunk::Fragment(text) => {
                print!("{text}");
                let _ = io::stdout().flush();
                full_response.push_str(&text);
            }
            StreamChunk::Failed(message) => {
                return Err(ProviderError::StreamAborted(message).into());
            }
        }
    }

    Ok(full_response)
}
