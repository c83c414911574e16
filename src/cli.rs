use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Promptsweep CLI definition.
#[derive(Debug, Parser)]
#[command(name = "promptsweep")]
#[command(about = "Sweep configured prompts across LLM deployments", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Verbose log output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full prompt/model sweep and persist every completion.
    Run(RunArgs),
    /// Send a single prompt to a single model without writing artifacts.
    Probe(ProbeArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[arg(
        long,
        default_value = "config.yaml",
        help = "Path to the sweep configuration file"
    )]
    pub config: PathBuf,

    #[arg(long, help = "Override the configured output directory")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Continue past failed pairs instead of aborting")]
    pub keep_going: bool,

    #[arg(long, help = "Print the run report as JSON")]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ProbeArgs {
    #[arg(
        long,
        default_value = "config.yaml",
        help = "Path to the sweep configuration file"
    )]
    pub config: PathBuf,

    #[arg(long, help = "Model deployment to probe (defaults to the first configured)")]
    pub model: Option<String>,

    #[arg(long, help = "Prompt to send (defaults to the first configured)")]
    pub prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_run_command() {
        let cli = Cli::parse_from([
            "promptsweep",
            "run",
            "--config",
            "sweep.yaml",
            "--output-dir",
            "./artifacts",
            "--keep-going",
            "--verbose",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Run(run) => {
                assert_eq!(run.config, PathBuf::from("sweep.yaml"));
                assert_eq!(run.output_dir.unwrap(), PathBuf::from("./artifacts"));
                assert!(run.keep_going);
                assert!(!run.json);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn parses_probe_command_with_overrides() {
        let cli = Cli::parse_from([
            "promptsweep",
            "probe",
            "--model",
            "gpt-4.1",
            "--prompt",
            "Name a division",
        ]);

        match cli.command {
            Commands::Probe(probe) => {
                assert_eq!(probe.config, PathBuf::from("config.yaml"));
                assert_eq!(probe.model.as_deref(), Some("gpt-4.1"));
                assert_eq!(probe.prompt.as_deref(), Some("Name a division"));
            }
            _ => panic!("expected probe command"),
        }
    }
}
