//! Per-job memoization of agent outputs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::error::SystemError;

/// Memoized result of a successful agent execution.
///
/// Failures are never cached, so an entry always means success.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub output: Value,
    /// Executor reasoning from the run that produced `output`; empty for seeds.
    pub reasoning: String,
}

impl CacheEntry {
    pub fn new(output: Value) -> Self {
        Self {
            output,
            reasoning: String::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

/// Job-scoped map of agent id -> output.
///
/// Writes happen as agents of a level complete; reads happen only for later
/// levels, so a plain mutex is enough.
#[derive(Debug, Default)]
pub struct MemoCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>, SystemError> {
        self.entries.lock().map_err(|_| SystemError::CachePoisoned)
    }

    pub fn get(&self, agent_id: &str) -> Result<Option<CacheEntry>, SystemError> {
        Ok(self.lock()?.get(agent_id).cloned())
    }

    pub fn put(&self, agent_id: impl Into<String>, entry: CacheEntry) -> Result<(), SystemError> {
        self.lock()?.insert(agent_id.into(), entry);
        Ok(())
    }

    pub fn contains(&self, agent_id: &str) -> Result<bool, SystemError> {
        Ok(self.lock()?.contains_key(agent_id))
    }

    /// Drop every entry. Also recovers a poisoned lock, since clearing is
    /// exactly what a job does on its way out.
    pub fn clear(&self) {
        match self.entries.lock() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
