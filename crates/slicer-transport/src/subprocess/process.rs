//! Process management for the slicebot subprocess

use crate::channel::Channel;
use crate::error::{Result, TransportError};
use crate::traits::ProcessControl;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Default executable name, resolved through `PATH`
pub const DEFAULT_PROGRAM: &str = "slicebot";

/// What to do with the child's standard error
///
/// The protocol never reads stderr, so it either goes to ours or nowhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StderrMode {
    /// Share the parent's stderr
    #[default]
    Inherit,
    /// Discard it
    Null,
}

/// Configuration for spawning the slicebot process
#[derive(Clone, Debug)]
pub struct ProcessConfig {
    /// Path to the executable
    pub program: PathBuf,

    /// Arguments to pass; slicebot itself takes none
    pub args: Vec<String>,

    /// Environment variables to set
    pub env: HashMap<String, String>,

    /// Start from an empty environment instead of inheriting ours
    pub env_clear: bool,

    /// Working directory for the child
    pub working_dir: Option<PathBuf>,

    /// Where the child's stderr goes
    pub stderr: StderrMode,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl ProcessConfig {
    /// Create a new process configuration
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            env_clear: false,
            working_dir: None,
            stderr: StderrMode::Inherit,
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Pass only the variables set with [`with_env`](Self::with_env)
    pub fn with_env_clear(mut self, env_clear: bool) -> Self {
        self.env_clear = env_clear;
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the stderr mode
    pub fn with_stderr(mut self, stderr: StderrMode) -> Self {
        self.stderr = stderr;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if self.env_clear {
            cmd.env_clear();
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(match self.stderr {
            StderrMode::Inherit => Stdio::inherit(),
            StderrMode::Null => Stdio::null(),
        });

        // A handle dropped without wait() still takes the child down
        cmd.kill_on_drop(true);
        cmd
    }
}

/// Control handle of a running slicebot process
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
    exit_code: Option<Option<i32>>,
}

impl ProcessHandle {
    /// Spawn the process and return its channel
    pub async fn spawn(config: &ProcessConfig) -> Result<Channel> {
        let mut child = config.command().spawn().map_err(|e| {
            TransportError::Process(format!(
                "Failed to spawn {}: {}",
                config.program.display(),
                e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Process("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Process("Failed to get stdout".to_string()))?;

        let pid = child.id();
        info!(program = %config.program.display(), pid = ?pid, "Spawned slicebot");

        let handle = Self {
            child,
            pid,
            exit_code: None,
        };
        Ok(Channel::new(stdout, stdin, handle))
    }
}

#[async_trait]
impl ProcessControl for ProcessHandle {
    async fn terminate(&mut self) -> Result<()> {
        if self.exit_code.is_some() {
            return Ok(());
        }
        // Already exited on its own: nothing to kill, wait() reaps it
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        match self.child.start_kill() {
            Ok(()) => {
                debug!(pid = ?self.pid, "Sent kill to slicebot");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(TransportError::Process(format!(
                "Failed to kill process: {}",
                e
            ))),
        }
    }

    async fn wait(&mut self) -> Result<Option<i32>> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| TransportError::Process(format!("Failed to wait for process: {}", e)))?;
        let code = status.code();
        self.exit_code = Some(code);
        debug!(pid = ?self.pid, code = ?code, "Reaped slicebot");
        Ok(code)
    }

    fn id(&self) -> Option<u32> {
        self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_config_default() {
        let config = ProcessConfig::default();
        assert_eq!(config.program, PathBuf::from("slicebot"));
        assert!(config.args.is_empty());
        assert!(!config.env_clear);
        assert_eq!(config.stderr, StderrMode::Inherit);
    }

    #[test]
    fn test_process_config_builder() {
        let config = ProcessConfig::new("/opt/jpdg/slicebot")
            .with_arg("--verbose")
            .with_env("JAVA_HOME", "/usr/lib/jvm")
            .with_env_clear(true)
            .with_working_dir("/tmp")
            .with_stderr(StderrMode::Null);

        assert_eq!(config.program, PathBuf::from("/opt/jpdg/slicebot"));
        assert_eq!(config.args, vec!["--verbose".to_string()]);
        assert_eq!(
            config.env.get("JAVA_HOME"),
            Some(&"/usr/lib/jvm".to_string())
        );
        assert!(config.env_clear);
        assert_eq!(config.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(config.stderr, StderrMode::Null);
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let config = ProcessConfig::new("/nonexistent/slicebot-does-not-exist");
        let err = ProcessHandle::spawn(&config).await.unwrap_err();
        assert!(matches!(err, TransportError::Process(_)));
        assert!(err.to_string().contains("Failed to spawn"));
    }
}
