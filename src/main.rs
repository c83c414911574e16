use std::{
    fs,
    sync::{Arc, OnceLock},
};

use anyhow::{Result, bail};
use clap::Parser;
use uuid::Uuid;

use promptsweep::{
    auth::{ClientCredentialProvider, CredentialConfig, TokenProvider},
    cli::{Cli, Commands, ProbeArgs, RunArgs},
    config::SweepConfig,
    llm::{AzureChatClient, CompletionClient},
    paths::home_env_path,
    sweep::{RunnerOptions, SweepRunner},
    tracing_setup,
};

static ENV_FILES_ONCE: OnceLock<()> = OnceLock::new();

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => {
            let run_id = new_run_id();
            let _guard = tracing_setup::init(cli.verbose, cli.log_json, Some(&run_id));
            run_command(args, &run_id).await?;
        }
        Commands::Probe(args) => {
            let _guard = tracing_setup::init(cli.verbose, cli.log_json, None);
            probe_command(args).await?;
        }
    }
    Ok(())
}

async fn run_command(args: RunArgs, run_id: &str) -> Result<()> {
    let mut config = SweepConfig::from_path(&args.config)?;
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    let config = Arc::new(config);

    // Credential resolution happens here, before any completion call.
    let client = build_client(&config)?;
    let runner = SweepRunner::new(
        config.clone(),
        client,
        RunnerOptions {
            keep_going: args.keep_going,
        },
    );

    println!(
        "Starting run {run_id} ({} models x {} prompts)",
        config.models.len(),
        config.prompts.len()
    );
    let report = runner.execute(run_id).await?;
    let manifest = report.write_manifest(&config.output.dir)?;

    if args.json {
        println!("{}", report.to_pretty_json()?);
    } else {
        println!(
            "Run {run_id}: {} succeeded, {} failed. Manifest: {}",
            report.succeeded(),
            report.failed(),
            manifest.display()
        );
    }

    if !report.is_success() {
        bail!("{} of {} pairs failed", report.failed(), report.pairs.len());
    }
    Ok(())
}

async fn probe_command(args: ProbeArgs) -> Result<()> {
    let config = Arc::new(SweepConfig::from_path(&args.config)?);
    let model = args
        .model
        .unwrap_or_else(|| config.models[0].clone());
    let prompt = args
        .prompt
        .unwrap_or_else(|| config.prompts[0].clone());
    let client = build_client(&config)?;
    run_probe(client, &model, &prompt).await
}

async fn run_probe(client: Arc<dyn CompletionClient>, model: &str, prompt: &str) -> Result<()> {
    println!("[probe] sending prompt to model '{model}'...");
    let response = client.complete(model, prompt).await?;
    println!("--- Completion Start ---\n{response}\n--- Completion End ---");
    Ok(())
}

fn build_client(config: &Arc<SweepConfig>) -> Result<Arc<dyn CompletionClient>> {
    ensure_env_files_loaded();
    let credentials = CredentialConfig::from_env()?;
    let tokens: Arc<dyn TokenProvider> = Arc::new(ClientCredentialProvider::new(
        reqwest::Client::new(),
        credentials,
        &config.authority,
        config.scope.clone(),
    ));
    Ok(Arc::new(AzureChatClient::new(config, tokens)?))
}

fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Loads `./.env` first, then `~/.env`; variables already present in the
/// process environment always win.
fn ensure_env_files_loaded() {
    ENV_FILES_ONCE.get_or_init(|| {
        let mut candidates = vec![std::path::PathBuf::from(".env")];
        if let Some(path) = home_env_path() {
            candidates.push(path);
        }
        for path in candidates {
            if let Ok(contents) = fs::read_to_string(&path) {
                apply_env_contents(&contents);
            }
        }
    });
}

fn apply_env_contents(contents: &str) {
    for line in contents.lines() {
        if let Some((key, value)) = parse_env_assignment(line)
            && std::env::var_os(&key).is_none()
        {
            unsafe {
                std::env::set_var(&key, &value);
            }
        }
    }
}

fn parse_env_assignment(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim();

    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = normalize_env_value(value.trim());
    Some((key.to_string(), value))
}

fn normalize_env_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('\"') && trimmed.ends_with('\"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}
