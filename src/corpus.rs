//! Prompt corpus loading.
//!
//! A corpus is a directory with one subdirectory per prompt group; each
//! subdirectory holds one file per prompt. The file name minus its extension
//! is the prompt id and the file contents are the prompt text, verbatim.
//! Non-directory entries at the root are ignored and nesting below one level
//! is not traversed.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// A named batch of prompts sharing a results subdirectory.
///
/// Prompts are ordered by file name, so run numbering is reproducible
/// across platforms regardless of directory-listing order.
#[derive(Debug, Clone)]
pub struct PromptGroup {
    pub name: String,
    pub prompts: Vec<(String, String)>,
}

impl PromptGroup {
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// Load all prompt groups under `dir`, sorted by group name.
pub fn load_prompts(dir: &Path) -> Result<Vec<PromptGroup>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read prompts directory {}", dir.display()))?;

    let mut group_dirs: Vec<_> = entries
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to list prompts directory {}", dir.display()))?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    group_dirs.sort();

    let mut groups = Vec::with_capacity(group_dirs.len());
    for group_dir in group_dirs {
        let name = group_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        groups.push(PromptGroup {
            prompts: load_group(&group_dir)?,
            name,
        });
    }
    Ok(groups)
}

fn load_group(group_dir: &Path) -> Result<Vec<(String, String)>> {
    let mut files: Vec<_> = fs::read_dir(group_dir)
        .with_context(|| format!("failed to read prompt group {}", group_dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to list prompt group {}", group_dir.display()))?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut prompts = Vec::with_capacity(files.len());
    for file in files {
        let id = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = fs::read_to_string(&file)
            .with_context(|| format!("failed to read prompt file {}", file.display()))?;
        prompts.push((id, text));
    }
    Ok(prompts)
}
