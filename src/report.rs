use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Per-run record of every (model, prompt) pair and where its completion
/// landed. Written as `manifest.json` next to the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub run_id: String,
    pub endpoint: String,
    pub pairs: Vec<PairOutcome>,
}

impl SweepReport {
    pub fn new(run_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            endpoint: endpoint.into(),
            pairs: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: PairOutcome) {
        self.pairs.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.pairs
            .iter()
            .filter(|pair| pair.status == PairStatus::Ok)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.pairs.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize sweep report")
    }

    pub fn write_manifest(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, self.to_pretty_json()?)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairOutcome {
    pub model: String,
    /// 1-based position of the prompt in the configured list.
    pub prompt_index: usize,
    pub prompt: String,
    pub status: PairStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl PairOutcome {
    pub fn ok(model: &str, prompt_index: usize, prompt: &str, artifact: PathBuf) -> Self {
        Self {
            model: model.to_string(),
            prompt_index,
            prompt: prompt.to_string(),
            status: PairStatus::Ok,
            artifact: Some(artifact),
            error: None,
        }
    }

    pub fn failed(model: &str, prompt_index: usize, prompt: &str, error: String) -> Self {
        Self {
            model: model.to_string(),
            prompt_index,
            prompt: prompt.to_string(),
            status: PairStatus::Failed,
            artifact: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Ok,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_report() -> SweepReport {
        let mut report = SweepReport::new("run-1", "https://example.openai.azure.com");
        report.record(PairOutcome::ok(
            "gpt-4o",
            1,
            "prompt one",
            PathBuf::from("out/division_name_gpt-4o_prompt1.txt"),
        ));
        report.record(PairOutcome::failed(
            "gpt-4o",
            2,
            "prompt two",
            "HTTP 500".into(),
        ));
        report
    }

    #[test]
    fn counts_successes_and_failures() {
        let report = sample_report();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn manifest_round_trips() {
        let temp = tempdir().unwrap();
        let report = sample_report();

        let path = report.write_manifest(temp.path()).expect("manifest written");
        assert_eq!(path, temp.path().join(MANIFEST_FILE));

        let raw = fs::read_to_string(&path).unwrap();
        let loaded: SweepReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.run_id, "run-1");
        assert_eq!(loaded.pairs.len(), 2);
        assert_eq!(loaded.pairs[1].status, PairStatus::Failed);
        assert_eq!(loaded.pairs[1].error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn successful_outcome_omits_error_field() {
        let report = sample_report();
        let json = report.to_pretty_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["pairs"][0].get("error").is_none());
        assert_eq!(value["pairs"][0]["status"], "ok");
    }
}
