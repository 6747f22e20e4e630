use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ExecError;
use crate::executor::{CommandExecutor, CommandOutput, ExitPolicy, Invocation, RealExecutor};

/// Default container engine CLI.
pub const DEFAULT_ENGINE: &str = "docker";

/// Container engine operations, parameterized over the executor for testability.
pub struct DockerClient<E: CommandExecutor = RealExecutor> {
    executor: E,
    engine: String,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
            engine: DEFAULT_ENGINE.to_owned(),
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            engine: DEFAULT_ENGINE.to_owned(),
        }
    }

    /// Use another engine CLI with a docker-compatible interface (e.g. podman).
    pub fn with_engine(mut self, engine: &str) -> Self {
        self.engine = engine.to_owned();
        self
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Run an invocation and apply its [`ExitPolicy`].
    pub async fn run_invocation(
        &self,
        invocation: &Invocation,
    ) -> Result<CommandOutput, DockerError> {
        let output = self
            .executor
            .exec(invocation)
            .await
            .map_err(|e| DockerError::Exec { source: e })?;

        if output.success() {
            return Ok(output);
        }

        tracing::debug!(
            command = %invocation,
            status = output.status,
            stderr = %output.stderr.trim(),
            "command exited non-zero"
        );

        match invocation.exit_policy {
            ExitPolicy::Tolerate => Ok(output),
            ExitPolicy::Fail => Err(DockerError::CommandFailed {
                command: invocation.to_string(),
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }

    fn engine_cmd(&self, args: Vec<String>) -> Invocation {
        Invocation::new(&self.engine, args)
    }

    // ── Engine ──

    pub async fn version(&self) -> Result<String, DockerError> {
        let output = self
            .run_invocation(&self.engine_cmd(args([
                "version",
                "--format",
                "{{.Server.Version}}",
            ])))
            .await?;
        Ok(output.stdout.trim().to_owned())
    }

    // ── Images ──

    /// `build -t <tag> -f <dockerfile> .` inside the build context.
    pub async fn build_image(
        &self,
        context_dir: &Path,
        dockerfile: &Path,
        tag: &str,
    ) -> Result<(), DockerError> {
        let dockerfile = path_arg(dockerfile)?;
        let invocation = self
            .engine_cmd(args(["build", "-t", tag, "-f", dockerfile.as_str(), "."]))
            .in_dir(context_dir);
        self.run_invocation(&invocation).await?;
        Ok(())
    }

    /// Human-readable image size as reported by the engine, e.g. `"86.4MB"`.
    pub async fn image_size(&self, tag: &str) -> Result<String, DockerError> {
        let output = self
            .run_invocation(&self.engine_cmd(args(["images", tag, "--format", "{{.Size}}"])))
            .await?;
        let size = output.stdout.lines().next().unwrap_or_default().trim();
        if size.is_empty() {
            return Err(DockerError::ImageNotFound(tag.to_owned()));
        }
        Ok(size.to_owned())
    }

    /// `save -o <archive> <tag>`.
    pub async fn save_image(&self, tag: &str, archive: &Path) -> Result<(), DockerError> {
        let archive = path_arg(archive)?;
        self.run_invocation(&self.engine_cmd(args(["save", "-o", archive.as_str(), tag])))
            .await?;
        Ok(())
    }

    /// `rmi <tag>`. A missing image is reported in the output, not as an error.
    pub async fn remove_image(&self, tag: &str) -> Result<CommandOutput, DockerError> {
        self.run_invocation(&self.engine_cmd(args(["rmi", tag])).tolerate_failure())
            .await
    }

    // ── Containers ──

    /// `run --rm [-i] <tag> <command...>` in a throwaway container.
    ///
    /// A non-zero exit is returned as output so the caller can try
    /// something else.
    pub async fn run_in_image(
        &self,
        tag: &str,
        command: &[String],
        interactive: bool,
    ) -> Result<CommandOutput, DockerError> {
        let mut run_args = vec!["run".to_owned(), "--rm".to_owned()];
        if interactive {
            run_args.push("-i".to_owned());
        }
        run_args.push(tag.to_owned());
        run_args.extend(command.iter().cloned());

        self.run_invocation(&self.engine_cmd(run_args).tolerate_failure())
            .await
    }

    // ── Host tools ──

    pub fn locate(&self, program: &str) -> Option<PathBuf> {
        self.executor.locate(program)
    }

    /// `<compressor> -9 -k <archive>`: maximum compression, keep the original.
    pub async fn compress(&self, compressor: &str, archive: &Path) -> Result<(), DockerError> {
        let archive = path_arg(archive)?;
        self.run_invocation(&Invocation::new(compressor, args(["-9", "-k", archive.as_str()])))
            .await?;
        Ok(())
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    pub async fn doctor(&self, compressor: &str) -> DoctorReport {
        let mut report = DoctorReport::default();

        match self.version().await {
            Ok(v) if !v.is_empty() => {
                report.engine = CheckResult::ok(&format!("{} {v}", self.engine));
            }
            Ok(_) => report.engine = CheckResult::fail("engine answered without a server version"),
            Err(e) => report.engine = CheckResult::fail(&e.to_string()),
        }

        report.compressor = match self.locate(compressor) {
            Some(path) => CheckResult::ok(&path.display().to_string()),
            None => CheckResult::fail(&format!(
                "{compressor} not found (compression will be skipped)"
            )),
        };

        report
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

fn path_arg(path: &Path) -> Result<String, DockerError> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| DockerError::InvalidPath(path.to_path_buf()))
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub engine: CheckResult,
    pub compressor: CheckResult,
    pub config_file: CheckResult,
}

impl DoctorReport {
    /// The compressor and config file are optional.
    pub fn required_passed(&self) -> bool {
        self.engine.passed
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "leanvm doctor")?;
        writeln!(f, "-------------")?;
        for (label, check) in [
            ("Container engine", &self.engine),
            ("Compressor", &self.compressor),
            ("leanvm.toml", &self.config_file),
        ] {
            writeln!(f, "{label:<18} {}  {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("failed to run external command")]
    Exec { source: ExecError },

    #[error("`{command}` exited with status {status}\n{stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stdout: String,
        stderr: String,
    },

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("image '{0}' not found")]
    ImageNotFound(String),
}
