use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::traits::{AgentPhase, StatusEvent, StatusPublisher};

/// Fan-out over the configured status publishers.
///
/// Publishing is fire-and-forget: errors and panics are logged and swallowed.
#[derive(Clone, Default)]
pub struct Publishers {
    inner: Arc<Vec<Arc<dyn StatusPublisher>>>,
}

impl Publishers {
    pub fn new(publishers: Vec<Arc<dyn StatusPublisher>>) -> Self {
        Self {
            inner: Arc::new(publishers),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn emit(&self, event: &StatusEvent) {
        for publisher in self.inner.iter() {
            match catch_unwind(AssertUnwindSafe(|| publisher.publish(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        publisher = publisher.name(),
                        job_id = event.job_id(),
                        error = %e,
                        "status publisher failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        publisher = publisher.name(),
                        job_id = event.job_id(),
                        "status publisher panicked"
                    );
                }
            }
        }
    }

    pub fn agent(&self, job_id: &str, agent_id: &str, status: AgentPhase, detail: Option<String>) {
        if self.is_empty() {
            return;
        }
        self.emit(&StatusEvent::agent(job_id, agent_id, status, detail));
    }
}
