use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ExecError;

/// What a non-zero exit status means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Non-zero status is an error; the calling stage stops.
    Fail,
    /// Non-zero status is returned as data; the caller decides.
    Tolerate,
}

/// One external command: program, arguments, optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub exit_policy: ExitPolicy,
}

impl Invocation {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_owned(),
            args,
            cwd: None,
            exit_policy: ExitPolicy::Fail,
        }
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn tolerate_failure(mut self) -> Self {
        self.exit_policy = ExitPolicy::Tolerate;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; -1 when the process was killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Abstraction over external command execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// Implementations report the exit status as data; the [`ExitPolicy`] is
/// applied by [`DockerClient`](crate::DockerClient), never here.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Run the command to completion and capture stdout/stderr.
    async fn exec(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError>;

    /// Find `program` on PATH.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Spawns real processes. No timeout: a hung command blocks the caller.
pub struct RealExecutor;

impl CommandExecutor for RealExecutor {
    async fn exec(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        use std::process::Stdio;

        tracing::info!(command = %invocation, "running");

        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| ExecError::Spawn {
            program: invocation.program.clone(),
            source: e,
        })?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        match which::which(program) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::debug!(program, error = %e, "not found on PATH");
                None
            }
        }
    }
}
