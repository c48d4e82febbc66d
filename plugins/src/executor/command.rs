use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use agentflow_core::api::{AgentError, AgentExecutor, AgentOutput, AgentRequest};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const STDERR_TAIL_BYTES: usize = 2048;

/// Runs an agent as a subprocess.
///
/// The request is written to stdin as one JSON document and stdin is closed,
/// while stdout is read to the end. Stdout must be JSON: either an object with an
/// `output` field (and optional `reasoning`) or any other value, taken as the
/// output itself. A non-zero exit status is an agent failure carrying the tail
/// of stderr.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    name: String,
    program: String,
    args: Vec<String>,
    envs: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl CommandExecutor {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            envs: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn envs(mut self, envs: BTreeMap<String, String>) -> Self {
        self.envs = envs;
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    fn command(&self, request: &AgentRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.envs)
            .env("AGENTFLOW_JOB_ID", &request.job_id)
            .env("AGENTFLOW_AGENT_ID", &request.agent_id)
            .env("AGENTFLOW_ROUTING_KEY", &request.routing_key)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // the engine drops the future on timeout or abort
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

#[async_trait]
impl AgentExecutor for CommandExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput, AgentError> {
        let payload = serde_json::to_vec(&request.to_json())?;

        let mut child = self.command(&request).spawn().map_err(|e| {
            AgentError::failed(format!("failed to spawn '{}': {e}", self.program))
        })?;

        // written while stdout is drained; filters stall once the pipe fills
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await
            })
        });

        let output = child.wait_with_output().await?;
        tracing::debug!(
            agent_id = %request.agent_id,
            program = %self.program,
            exit_code = output.status.code().unwrap_or(-1),
            stdout_bytes = output.stdout.len(),
            "command agent exited"
        );
        let written = match writer {
            Some(handle) => handle
                .await
                .map_err(|e| AgentError::failed(format!("stdin writer failed: {e}")))?,
            None => Ok(()),
        };

        if !output.status.success() {
            return Err(AgentError::failed(format!(
                "'{}' exited with {}: {}",
                self.program,
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr_tail(&output.stderr)
            )));
        }

        // a program that ignores its input may exit before reading it
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }

        parse_stdout(&output.stdout)
    }
}

fn parse_stdout(stdout: &[u8]) -> Result<AgentOutput, AgentError> {
    let value: Value = serde_json::from_slice(stdout)?;
    match value {
        Value::Object(ref map) if map.contains_key("output") => {
            Ok(serde_json::from_value::<AgentOutput>(value)?)
        }
        other => Ok(AgentOutput::new(other)),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
