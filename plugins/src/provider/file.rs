use std::path::{Path, PathBuf};

use agentflow_core::api::{
    Graph, GraphProvider, JobDescriptor, Playbook, PlaybookFormat, ProviderError,
};
use async_trait::async_trait;

const EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Loads playbooks from disk.
///
/// `descriptor.playbook` is either a path to a `.toml`/`.json` file or a bare
/// name resolved under the configured playbook directory (`<dir>/<name>.toml`,
/// then `<dir>/<name>.json`).
#[derive(Debug, Clone, Default)]
pub struct FilePlaybookProvider {
    dir: Option<PathBuf>,
}

impl FilePlaybookProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Locate the playbook file for a descriptor.
    pub fn resolve(&self, playbook: &str) -> Result<PathBuf, ProviderError> {
        let direct = Path::new(playbook);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        if let Some(dir) = &self.dir {
            let joined = dir.join(playbook);
            if joined.is_file() {
                return Ok(joined);
            }
            for ext in EXTENSIONS {
                let candidate = dir.join(format!("{playbook}.{ext}"));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        Err(ProviderError::NotFound(playbook.to_string()))
    }

    pub async fn read_playbook(&self, playbook: &str) -> Result<Playbook, ProviderError> {
        let path = self.resolve(playbook)?;
        let format = PlaybookFormat::from_path(&path)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ProviderError::Io {
                path: path.display().to_string(),
                source,
            })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "playbook read");
        Playbook::parse(&content, format)
    }
}

#[async_trait]
impl GraphProvider for FilePlaybookProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, descriptor: &JobDescriptor) -> Result<Graph, ProviderError> {
        let playbook = self.read_playbook(&descriptor.playbook).await?;
        Ok(playbook.to_graph()?)
    }
}
