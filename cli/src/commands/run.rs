use std::collections::BTreeMap;
use std::path::PathBuf;

use agentflow_core::api::{
    AppConfig, ErrorCode, ExecutionEngine, ExecutionOpts, JobDescriptor, JobInput, JobResult,
    JobStatus, OrchestratorError, Orchestrator,
};
use agentflow_plugins::factory::{build_provider, build_publishers, build_registry, build_sink};
use agentflow_plugins::sink::read_saved_job;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::cli::RunArgs;
use crate::error::CliError;
use crate::render::print_result;

pub async fn run_cmd(
    args: RunArgs,
    playbook_dir: Option<PathBuf>,
    cfg: &AppConfig,
) -> Result<i32, CliError> {
    let payload = read_payload(&args)?;
    let seeds = read_seeds(&args)?;
    let opts = execution_opts(&args, cfg);
    let format = args.format.unwrap_or(cfg.output.format);
    let progress = cfg.output.progress_bar && !args.no_progress && atty::is(atty::Stream::Stderr);

    let registry = build_registry(cfg).map_err(|e| CliError::Config(e.to_string()))?;
    let engine = ExecutionEngine::builder(registry)
        .opts(opts)
        .publishers(build_publishers(format, progress))
        .build();

    let mut orchestrator = Orchestrator::new(build_provider(playbook_dir), engine);
    if !args.no_sink {
        let sink = build_sink(cfg, args.output_dir.clone())
            .map_err(|e| CliError::Config(e.to_string()))?;
        if let Some(sink) = sink {
            orchestrator = orchestrator.with_sink(sink);
        }
    }

    let cancel = CancellationToken::new();
    let ctrl_c = spawn_ctrl_c_listener(cancel.clone());

    let mut input = JobInput::new(payload)
        .with_seed_outputs(seeds)
        .with_cancellation(cancel);
    if let Some(job_id) = &args.job_id {
        input = input.with_job_id(job_id.clone());
    }

    let descriptor = JobDescriptor::new(&args.playbook.playbook);
    let outcome = orchestrator.run_with(&descriptor, input).await;
    ctrl_c.abort();

    match outcome {
        Ok(outcome) => {
            print_result(format, &outcome.result, Some(&outcome.synthesized_output));
            Ok(exit_code_for_result(&outcome.result))
        }
        Err(e) => {
            // the job ran; keep its log visible even though saving failed
            if let OrchestratorError::Sink { result, .. } = &e {
                print_result(format, result, None);
            }
            Err(e.into())
        }
    }
}

pub fn exit_code_for_result(result: &JobResult) -> i32 {
    let code = match (result.status, result.cancelled) {
        (JobStatus::Failed, _) => ErrorCode::JobFailed,
        (JobStatus::Completed, true) => ErrorCode::Cancelled,
        (JobStatus::Completed, false) => ErrorCode::Success,
    };
    code.as_u16() as i32
}

fn execution_opts(args: &RunArgs, cfg: &AppConfig) -> ExecutionOpts {
    let mut engine = cfg.engine.clone();
    if let Some(n) = args.max_concurrency {
        engine.max_concurrency = n;
    }
    if let Some(ms) = args.agent_timeout_ms {
        engine.agent_timeout_ms = ms;
    }
    if let Some(ms) = args.job_timeout_ms {
        engine.job_timeout_ms = Some(ms);
    }
    if let Some(policy) = args.failure_policy {
        engine.failure_policy = policy;
    }
    ExecutionOpts::from(&engine)
}

fn read_payload(args: &RunArgs) -> Result<Value, CliError> {
    if let Some(inline) = &args.input_json {
        return serde_json::from_str(inline)
            .map_err(|e| CliError::Input(format!("--input-json is not valid JSON: {e}")));
    }
    if let Some(path) = &args.input {
        let content = std::fs::read_to_string(path)?;
        return serde_json::from_str(&content)
            .map_err(|e| CliError::Input(format!("{} is not valid JSON: {e}", path.display())));
    }
    Ok(Value::Object(Default::default()))
}

fn read_seeds(args: &RunArgs) -> Result<BTreeMap<String, Value>, CliError> {
    let Some(path) = &args.resume else {
        return Ok(BTreeMap::new());
    };
    let saved = read_saved_job(path).map_err(|e| CliError::Input(e.to_string()))?;
    let seeds = saved.seed_outputs();
    tracing::info!(
        resume_from = %saved.job_id,
        seeded = seeds.len(),
        "resuming from saved job result"
    );
    Ok(seeds)
}

fn spawn_ctrl_c_listener(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling remaining agents");
            cancel.cancel();
        }
    })
}
