use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to the peers of a failing agent within the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Peers already dispatched run to completion.
    #[default]
    DrainLevel,
    /// Unfinished peers are aborted and logged as skipped.
    CancelLevel,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DrainLevel => "drain-level",
            Self::CancelLevel => "cancel-level",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "drain-level" | "drain" => Ok(Self::DrainLevel),
            "cancel-level" | "cancel" => Ok(Self::CancelLevel),
            other => Err(format!(
                "unknown failure policy '{other}' (expected drain-level or cancel-level)"
            )),
        }
    }
}

/// `[engine]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_agent_timeout_ms")]
    pub agent_timeout_ms: u64,
    #[serde(default)]
    pub job_timeout_ms: Option<u64>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_max_concurrency() -> usize {
    8
}

fn default_agent_timeout_ms() -> u64 {
    120_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            agent_timeout_ms: default_agent_timeout_ms(),
            job_timeout_ms: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Runtime options for the execution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOpts {
    /// Maximum agents in flight within one level
    pub max_concurrency: usize,
    /// Per-agent timeout unless the agent overrides it
    pub agent_timeout: Duration,
    /// Whole-job deadline; reaching it cancels remaining dispatch
    pub job_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ExecutionOpts {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency.max(1),
            agent_timeout: Duration::from_millis(cfg.agent_timeout_ms),
            job_timeout: cfg.job_timeout_ms.map(Duration::from_millis),
            failure_policy: cfg.failure_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults_from_empty_toml() {
        let cfg: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, EngineConfig::default());

        let opts = ExecutionOpts::from(&cfg);
        assert_eq!(opts.max_concurrency, 8);
        assert_eq!(opts.agent_timeout, Duration::from_secs(120));
        assert_eq!(opts.job_timeout, None);
        assert_eq!(opts.failure_policy, FailurePolicy::DrainLevel);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let cfg = EngineConfig {
            max_concurrency: 0,
            ..EngineConfig::default()
        };
        assert_eq!(ExecutionOpts::from(&cfg).max_concurrency, 1);
    }

    #[test]
    fn test_failure_policy_parsing() {
        let cfg: EngineConfig = toml::from_str(r#"failure_policy = "cancel-level""#).unwrap();
        assert_eq!(cfg.failure_policy, FailurePolicy::CancelLevel);
        assert_eq!(
            "drain".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::DrainLevel
        );
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }
}
