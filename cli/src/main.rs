use agentflow_cli::commands::cli::{self, Commands};
use agentflow_cli::commands::{plan, run, validate};
use agentflow_cli::error::CliError;
use agentflow_core::api::{load_default, load_from_path, AppConfig, LoggingConfig};
use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(&args)?;
    init_tracing(&cfg.logging).map_err(|e| CliError::Command(format!("{e:#}")))?;

    match args.command {
        Commands::Run(run_args) => run::run_cmd(run_args, args.playbook_dir, &cfg).await,
        Commands::Validate(pb) => validate::validate_cmd(pb, args.playbook_dir, &cfg).await,
        Commands::Plan(plan_args) => plan::plan_cmd(plan_args, args.playbook_dir, &cfg).await,
    }
}

fn load_config(args: &cli::Args) -> Result<AppConfig, CliError> {
    let loaded = match &args.config {
        Some(path) => load_from_path(path),
        None => load_default(),
    };
    loaded.map_err(|e| CliError::Config(e.to_string()))
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone())
            .with_context(|| format!("invalid log level '{}'", logging.level))?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("agentflow"),
        };

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create log dir {} failed", dir.display()))?;
        let file_name = format!("agentflow.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        bail!("logging disabled for both console and file");
    }

    // stdout carries results and JSONL events, so logs stay on stderr
    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_rejects_unusable_logging() {
        let bad_level = LoggingConfig {
            level: "agentflow=loud".to_string(),
            ..LoggingConfig::default()
        };
        if std::env::var("RUST_LOG").map_or(true, |v| v.trim().is_empty()) {
            let err = init_tracing(&bad_level).unwrap_err();
            assert!(format!("{err:#}").contains("invalid log level"), "{err:#}");
        }

        let silent = LoggingConfig {
            console: false,
            file: false,
            ..LoggingConfig::default()
        };
        let err = init_tracing(&silent).unwrap_err();
        assert!(err.to_string().contains("both console and file"));
    }
}
