use std::path::PathBuf;

use agentflow_core::api::{FailurePolicy, OutputFormat};
use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agentflow", version, about = "Run agent playbooks as dependency graphs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file. Replaces ~/.agentflow/config.toml and ./agentflow.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory used to resolve bare playbook names (`<dir>/<name>.toml|json`).
    #[arg(long, global = true)]
    pub playbook_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlaybookArgs {
    /// Playbook path or name.
    #[arg(long, short = 'p')]
    pub playbook: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub playbook: PlaybookArgs,

    /// JSON file with the job input.
    #[arg(long, group = "job_input")]
    pub input: Option<PathBuf>,

    /// Inline JSON job input.
    #[arg(long, group = "job_input")]
    pub input_json: Option<String>,

    #[arg(long)]
    pub job_id: Option<String>,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    #[arg(long)]
    pub agent_timeout_ms: Option<u64>,

    #[arg(long)]
    pub job_timeout_ms: Option<u64>,

    /// drain-level | cancel-level
    #[arg(long, value_parser = parse_failure_policy)]
    pub failure_policy: Option<FailurePolicy>,

    /// text | jsonl
    #[arg(long, value_parser = parse_output_format)]
    pub format: Option<OutputFormat>,

    /// Directory for the JSON job result (enables the sink).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Do not persist the job result.
    #[arg(long, default_value_t = false, conflicts_with = "output_dir")]
    pub no_sink: bool,

    /// Saved job result whose successful outputs seed this run.
    #[arg(long)]
    pub resume: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Text,
    Json,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub playbook: PlaybookArgs,

    #[arg(long, value_enum, default_value_t = PlanFormat::Text)]
    pub format: PlanFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a playbook.
    Run(RunArgs),
    /// Check a playbook without running it.
    Validate(PlaybookArgs),
    /// Print the execution levels of a playbook.
    Plan(PlanArgs),
}

fn parse_failure_policy(s: &str) -> Result<FailurePolicy, String> {
    s.parse()
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}
