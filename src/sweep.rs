use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    config::SweepConfig,
    llm::CompletionClient,
    output::ArtifactWriter,
    report::{PairOutcome, SweepReport},
};

/// Orchestrates one sweep: models outer, prompts inner, one completion call
/// per pair, sequentially. Each completion is echoed to stdout and persisted
/// as its own artifact.
pub struct SweepRunner {
    config: Arc<SweepConfig>,
    client: Arc<dyn CompletionClient>,
    options: RunnerOptions,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunnerOptions {
    /// Record a failed pair and keep sweeping instead of stopping at it.
    pub keep_going: bool,
}

impl SweepRunner {
    pub fn new(
        config: Arc<SweepConfig>,
        client: Arc<dyn CompletionClient>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            config,
            client,
            options,
        }
    }

    /// Walks the configured cross-product. Returns the report covering every
    /// pair that was attempted; the caller decides the exit status from it.
    /// Local write failures abort regardless of `keep_going`.
    pub async fn execute(&self, run_id: &str) -> Result<SweepReport> {
        let writer = ArtifactWriter::new(&self.config.output.dir, &self.config.output.prefix);
        let mut report = SweepReport::new(run_id, &self.config.endpoint);
        info!(
            run_id,
            models = self.config.models.len(),
            prompts = self.config.prompts.len(),
            pairs = self.config.pair_count(),
            "Starting sweep"
        );

        for model in &self.config.models {
            for (position, prompt) in self.config.prompts.iter().enumerate() {
                let idx = position + 1;
                println!("Model: {model}, Prompt {idx}");

                match self.client.complete(model, prompt).await {
                    Ok(content) => {
                        println!("\n{content}\n");
                        let path = writer.write(model, idx, &content)?;
                        info!(
                            %model,
                            prompt_index = idx,
                            artifact = %path.display(),
                            "Pair completed"
                        );
                        report.record(PairOutcome::ok(model, idx, prompt, path));
                    }
                    Err(err) => {
                        report.record(PairOutcome::failed(model, idx, prompt, err.to_string()));
                        if self.options.keep_going {
                            warn!(%model, prompt_index = idx, error = %err, "Pair failed, continuing");
                        } else {
                            warn!(%model, prompt_index = idx, error = %err, "Pair failed, aborting sweep");
                            return Ok(report);
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}
