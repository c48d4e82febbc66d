use std::collections::HashMap;
use std::sync::RwLock;

use agentflow_core::api::{Graph, GraphProvider, JobDescriptor, Playbook, ProviderError};
use async_trait::async_trait;

/// Playbooks registered in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemoryPlaybookProvider {
    playbooks: RwLock<HashMap<String, Playbook>>,
}

impl MemoryPlaybookProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, playbook: Playbook) {
        let mut map = self
            .playbooks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.insert(playbook.name.clone(), playbook);
    }

    pub fn with(self, playbook: Playbook) -> Self {
        self.insert(playbook);
        self
    }
}

#[async_trait]
impl GraphProvider for MemoryPlaybookProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, descriptor: &JobDescriptor) -> Result<Graph, ProviderError> {
        let map = self
            .playbooks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let playbook = map
            .get(&descriptor.playbook)
            .ok_or_else(|| ProviderError::NotFound(descriptor.playbook.clone()))?;
        Ok(playbook.to_graph()?)
    }
}
