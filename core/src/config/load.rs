use std::path::{Path, PathBuf};

use super::types::AppConfig;

pub const LOCAL_CONFIG_FILE: &str = "agentflow.toml";

/// Get the default agentflow data directory: ~/.agentflow
pub fn get_agentflow_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".agentflow"))
}

/// Default directory for JSON job results.
pub fn default_results_dir() -> anyhow::Result<PathBuf> {
    Ok(get_agentflow_data_dir()?.join("results"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.agentflow/config.toml
    let user_config = get_agentflow_data_dir()?.join("config.toml");

    // Priority 2: ./agentflow.toml
    let local_config = Path::new(LOCAL_CONFIG_FILE);

    let mut cfg = if user_config.exists() {
        read_config(&user_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

/// Load an explicit config file; it wins over the default locations.
pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
    let mut cfg = read_config(path.as_ref())?;
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
}

fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Some(v) = env_value("AGENTFLOW_MAX_CONCURRENCY") {
        cfg.engine.max_concurrency = v
            .parse()
            .map_err(|_| anyhow::anyhow!("AGENTFLOW_MAX_CONCURRENCY must be a number, got '{v}'"))?;
    }
    if let Some(v) = env_value("AGENTFLOW_AGENT_TIMEOUT_MS") {
        cfg.engine.agent_timeout_ms = v
            .parse()
            .map_err(|_| anyhow::anyhow!("AGENTFLOW_AGENT_TIMEOUT_MS must be a number, got '{v}'"))?;
    }
    if let Some(v) = env_value("AGENTFLOW_FAILURE_POLICY") {
        cfg.engine.failure_policy = v.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    Ok(())
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_path_reads_sections() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[engine]\nagent_timeout_ms = 500\n\n[sink]\nenabled = false").expect("write");

        let cfg = load_from_path(file.path()).expect("load");
        assert_eq!(cfg.engine.agent_timeout_ms, 500);
        assert!(!cfg.sink.enabled);
    }

    #[test]
    fn test_invalid_config_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[engine]\nmax_concurrency = \"many\"").expect("write");

        let err = load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
