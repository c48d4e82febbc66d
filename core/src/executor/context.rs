use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cache::{CacheEntry, MemoCache};
use crate::error::SystemError;

/// Caller-supplied input for one job.
#[derive(Debug, Clone)]
pub struct JobInput {
    pub job_id: String,
    pub payload: Value,
    /// Outputs from an earlier run, preloaded into the cache (resume).
    pub seed_outputs: BTreeMap<String, Value>,
    /// External cancellation; a job-private token is used when absent.
    pub cancel: Option<CancellationToken>,
}

impl JobInput {
    pub fn new(payload: Value) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            payload,
            seed_outputs: BTreeMap::new(),
            cancel: None,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    pub fn with_seed_outputs(mut self, seeds: BTreeMap<String, Value>) -> Self {
        self.seed_outputs = seeds;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Per-job execution state. Owns the memoization cache and clears it when dropped.
#[derive(Debug)]
pub struct JobContext {
    job_id: String,
    payload: Arc<Value>,
    cache: MemoCache,
    cancel: CancellationToken,
}

impl JobContext {
    pub fn new(input: JobInput) -> Result<Self, SystemError> {
        let cache = MemoCache::new();
        for (agent_id, output) in input.seed_outputs {
            cache.put(agent_id, CacheEntry::new(output))?;
        }

        Ok(Self {
            job_id: input.job_id,
            payload: Arc::new(input.payload),
            cache,
            cancel: input.cancel.unwrap_or_else(CancellationToken::new),
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn payload(&self) -> Arc<Value> {
        self.payload.clone()
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for JobContext {
    fn drop(&mut self) {
        self.cache.clear();
    }
}
