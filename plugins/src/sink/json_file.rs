use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use agentflow_core::api::{AgentStatus, ExecutionLogEntry, JobStatus, ResultSink, SinkError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

const DIGEST_SUFFIX_LEN: usize = 8;

/// On-disk form of one job, `<dir>/<job_id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedJob {
    pub job_id: String,
    pub status: JobStatus,
    pub saved_at: DateTime<Utc>,
    pub synthesized_output: Value,
    pub execution_log: Vec<ExecutionLogEntry>,
}

impl SavedJob {
    /// Outputs usable as resume seeds: success and cached entries only.
    pub fn seed_outputs(&self) -> BTreeMap<String, Value> {
        self.execution_log
            .iter()
            .filter(|e| matches!(e.status, AgentStatus::Success | AgentStatus::Cached))
            .filter_map(|e| e.output.clone().map(|o| (e.agent_id.clone(), o)))
            .collect()
    }
}

/// Writes each job result as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(job_id)))
    }
}

/// Job ids become file names; keep them to a safe character set. An id that
/// needed rewriting gets a digest suffix so distinct ids never share a file.
fn file_stem(job_id: &str) -> String {
    let safe: String = job_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe == job_id {
        return safe;
    }
    let digest = format!("{:x}", Sha256::digest(job_id.as_bytes()));
    format!("{safe}-{}", &digest[..DIGEST_SUFFIX_LEN])
}

#[async_trait]
impl ResultSink for JsonFileSink {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn save(
        &self,
        job_id: &str,
        synthesized_output: &Value,
        execution_log: &[ExecutionLogEntry],
    ) -> Result<(), SinkError> {
        let io_err = |path: &Path, source| SinkError::Io {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err(&self.dir, e))?;

        let saved = SavedJob {
            job_id: job_id.to_string(),
            status: JobStatus::from_log(execution_log),
            saved_at: Utc::now(),
            synthesized_output: synthesized_output.clone(),
            execution_log: execution_log.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&saved)?;

        let path = self.path_for(job_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_err(&path, e))?;

        tracing::info!(job_id, path = %path.display(), entries = execution_log.len(), "job result saved");
        Ok(())
    }
}

/// Read a result written by [`JsonFileSink`].
pub fn read_saved_job(path: impl AsRef<Path>) -> anyhow::Result<SavedJob> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{} is not a saved job result: {e}", path.display()))
}
