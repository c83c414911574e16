use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Writes completions to disk, one file per (model, prompt) pair.
///
/// Filenames follow `{prefix}_{slug(model)}_prompt{index}.txt` with a 1-based
/// prompt index, so a fixed configuration always produces the same names and
/// distinct models never collide.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    prefix: String,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, model: &str, prompt_index: usize) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_prompt{}.txt",
            self.prefix,
            slugify(model),
            prompt_index
        ))
    }

    /// Persists one completion. The file is created (or replaced from an
    /// earlier run) and never touched again within the same run.
    pub fn write(&self, model: &str, prompt_index: usize, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create output directory {}", self.dir.display())
        })?;
        let path = self.artifact_path(model, prompt_index);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write artifact {}", path.display()))?;
        Ok(path)
    }
}

/// Maps a model identifier to a filesystem-safe filename component. Dots stay
/// so names like `gpt-4.1` remain recognizable.
pub fn slugify(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
