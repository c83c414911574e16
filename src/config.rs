use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::output::slugify;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

/// Static description of one sweep: which endpoint to call, which model
/// deployments to target, and which prompts to send to each of them.
#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    /// Azure OpenAI resource endpoint, e.g. `https://my-res.openai.azure.com`.
    pub endpoint: String,
    pub api_version: String,
    /// Token issuer base URL. Overridable so tests can point at a stub.
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Deployment names, outer loop of the sweep.
    pub models: Vec<String>,
    /// Prompts, inner loop of the sweep. Order is preserved; artifact names
    /// use the 1-based position in this list.
    pub prompts: Vec<String>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SweepConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file at {}", path_ref.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("Invalid configuration in {}", path_ref.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Unable to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.endpoint.trim().is_empty(),
            "Configuration must define an endpoint"
        );
        ensure!(
            !self.api_version.trim().is_empty(),
            "Configuration must define an api_version"
        );
        ensure!(
            !self.authority.trim().is_empty(),
            "authority must not be blank"
        );
        ensure!(!self.scope.trim().is_empty(), "scope must not be blank");
        ensure!(
            !self.models.is_empty(),
            "Configuration must list at least one model"
        );
        ensure!(
            !self.prompts.is_empty(),
            "Configuration must list at least one prompt"
        );
        for (idx, model) in self.models.iter().enumerate() {
            ensure!(!model.trim().is_empty(), "models[{idx}] must not be blank");
        }
        for (idx, prompt) in self.prompts.iter().enumerate() {
            ensure!(
                !prompt.trim().is_empty(),
                "prompts[{idx}] must not be blank"
            );
        }
        // Artifact names derive from slugify(model), so models must stay
        // distinct after slugging, not just as raw strings.
        let mut seen = HashSet::new();
        for model in &self.models {
            let slug = slugify(model);
            ensure!(
                !seen.contains(&slug),
                "Model '{model}' collides with another configured model (both slug to '{slug}')"
            );
            seen.insert(slug);
        }
        self.output.validate()?;
        Ok(())
    }

    /// Number of completion calls one full sweep will issue.
    pub fn pair_count(&self) -> usize {
        self.models.len() * self.prompts.len()
    }
}

impl FromStr for SweepConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml_str(s)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Leading component of every artifact filename.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            !self.prefix.trim().is_empty(),
            "output.prefix must not be blank"
        );
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            prefix: default_prefix(),
        }
    }
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_prefix() -> String {
    "completion".to_string()
}
