use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use leanvm_core::{LeanVmConfig, PipelineSettings, Profile};
use leanvm_docker::DockerClient;
use leanvm_docker::error::ExecError;
use leanvm_docker::executor::{CommandExecutor, CommandOutput, Invocation};
use leanvm_pipeline::{ArtifactRef, Pipeline, PipelineError, Stage, StageStatus};
use mockall::mock;
use tempfile::TempDir;

mock! {
    Executor {}

    impl CommandExecutor for Executor {
        async fn exec(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError>;
        fn locate(&self, program: &str) -> Option<PathBuf>;
    }
}

// ── Scripted engine ──

/// How the fake engine answers. `Some(stdout)` is exit 0, `None` is exit 1.
#[derive(Clone)]
struct Plan {
    engine_missing: bool,
    build: bool,
    /// Whether `images --format {{.Size}}` answers.
    size_query: bool,
    shell: bool,
    iex: Option<&'static str>,
    erl_eval: Option<&'static str>,
    release: Option<&'static str>,
    release_shell: Option<&'static str>,
    /// Bytes `save` writes; `None` makes `save` fail.
    archive_bytes: Option<usize>,
    /// Whether `locate` finds the compressor.
    compressor_on_path: bool,
    /// Bytes the compressor writes; `None` makes it exit non-zero.
    compressed_bytes: Option<usize>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            engine_missing: false,
            build: true,
            size_query: true,
            shell: true,
            iex: Some("Hello from IEx!\n"),
            erl_eval: Some("Hello from Erlang\n"),
            release: Some("Hello from minimal Elixir VM!\n"),
            release_shell: Some("Hello from minimal Elixir VM!\n"),
            archive_bytes: Some(100),
            compressor_on_path: false,
            compressed_bytes: None,
        }
    }
}

fn spawn_error(program: &str) -> ExecError {
    ExecError::Spawn {
        program: program.to_owned(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
    }
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        status: 0,
        stdout: stdout.to_owned(),
        stderr: String::new(),
    }
}

fn failed(status: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        status,
        stdout: String::new(),
        stderr: stderr.to_owned(),
    }
}

fn respond(inv: &Invocation, plan: &Plan) -> Result<CommandOutput, ExecError> {
    if plan.engine_missing {
        return Err(spawn_error(&inv.program));
    }

    // anything but the engine is the compressor; it names its output the way
    // the real tool does
    if inv.program != "docker" {
        let archive = inv.args.last().unwrap();
        let ext = match inv.program.as_str() {
            "gzip" => "gz",
            _ => "xz",
        };
        return match plan.compressed_bytes {
            Some(bytes) => {
                std::fs::write(format!("{archive}.{ext}"), vec![0u8; bytes]).unwrap();
                Ok(ok(""))
            }
            None => Ok(failed(1, "xz: (stdin): Cannot allocate memory")),
        };
    }

    let reply = match inv.args[0].as_str() {
        "build" => plan.build.then_some("Successfully tagged"),
        "images" => plan.size_query.then_some("86.4MB\n"),
        "save" => plan.archive_bytes.map(|bytes| {
            std::fs::write(&inv.args[2], vec![0u8; bytes]).unwrap();
            ""
        }),
        "rmi" => plan.build.then_some("Untagged"),
        "run" => run_reply(&inv.args, plan),
        _ => None,
    };

    Ok(match reply {
        Some(stdout) => ok(stdout),
        None => failed(1, "stubbed failure"),
    })
}

fn run_reply(args: &[String], plan: &Plan) -> Option<&'static str> {
    let has = |word: &str| args.iter().any(|a| a == word);
    let mentions = |text: &str| args.iter().any(|a| a.contains(text));

    if has("ls") {
        Some("total 0\n")
    } else if mentions("echo Hello from container") {
        plan.shell.then_some("Hello from container\n")
    } else if has("-version") {
        Some("Erlang (SMP,ASYNC_THREADS) version 14.2\n")
    } else if has("iex") {
        plan.iex
    } else if has("-eval") {
        plan.erl_eval
    } else if mentions("./bin/hello_world start") {
        plan.release_shell
    } else if mentions("/app/bin/hello_world") {
        plan.release
    } else {
        None
    }
}

struct Harness {
    tmp: TempDir,
    pipeline: Pipeline<MockExecutor>,
    log: Arc<Mutex<Vec<Invocation>>>,
}

impl Harness {
    fn new(profile: Profile, plan: Plan) -> Self {
        Self::with_config(profile, &LeanVmConfig::default(), plan)
    }

    fn with_config(profile: Profile, config: &LeanVmConfig, plan: Plan) -> Self {
        let tmp = TempDir::new().unwrap();
        let settings = PipelineSettings::resolve(config, profile, tmp.path()).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&log);
        let on_path = plan
            .compressor_on_path
            .then(|| PathBuf::from("/usr/bin").join(&settings.compressor));

        let mut mock = MockExecutor::new();
        mock.expect_exec().returning(move |inv| {
            recorder.lock().unwrap().push(inv.clone());
            respond(inv, &plan)
        });
        mock.expect_locate().returning(move |_| on_path.clone());

        Self {
            tmp,
            pipeline: Pipeline::new(settings, DockerClient::with_executor(mock)),
            log,
        }
    }

    /// Number of engine calls whose subcommand is `sub`.
    fn calls(&self, sub: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|inv| inv.args.first().is_some_and(|a| a == sub))
            .count()
    }

    fn ran(&self, text: &str) -> bool {
        self.log
            .lock()
            .unwrap()
            .iter()
            .any(|inv| inv.args.iter().any(|a| a.contains(text)))
    }

    fn settings(&self) -> &PipelineSettings {
        self.pipeline.settings()
    }
}

// ── End-to-end ──

#[tokio::test]
async fn end_to_end_success() {
    let h = Harness::new(Profile::Runtime, Plan::default());
    let mut generated = Vec::new();

    let summary = h
        .pipeline
        .run_with(|outcome| {
            if outcome.stage == Stage::Generate {
                let path = outcome.path().unwrap().to_path_buf();
                generated.push((path.clone(), std::fs::read_to_string(&path).unwrap()));
            }
        })
        .await
        .unwrap();

    let (path, content) = &generated[0];
    assert_eq!(*path, h.tmp.path().join("build").join("Dockerfile"));
    assert!(!content.is_empty());

    let build = summary.outcome(Stage::Build).unwrap();
    assert_eq!(build.image(), Some("elixir-lean-vm-test"));
    assert!(build.notes.iter().any(|n| n.contains("86.4MB")));

    assert!(summary.passed(Stage::Verify));
    assert_eq!(
        summary.outcome(Stage::Verify).unwrap().detail,
        "iex succeeded"
    );

    let export = summary.outcome(Stage::Export).unwrap();
    assert!(export.succeeded());
    assert_eq!(
        export.artifact,
        Some(ArtifactRef::Path(h.settings().archive.clone()))
    );

    assert_eq!(h.calls("rmi"), 1);
    for path in h.settings().artifact_paths() {
        assert!(!path.exists(), "{} left behind", path.display());
    }

    assert!(summary.overall_success());
    assert_eq!(summary.exit_code(), 0);
    let stages: Vec<Stage> = summary.outcomes.iter().map(|o| o.stage).collect();
    assert_eq!(
        stages,
        [
            Stage::Generate,
            Stage::Build,
            Stage::Verify,
            Stage::Export,
            Stage::Cleanup
        ]
    );
}

#[tokio::test]
async fn build_failure_short_circuits_later_stages() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            build: false,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    assert_eq!(summary.outcome(Stage::Build).unwrap().status, StageStatus::Failed);
    assert_eq!(summary.outcome(Stage::Build).unwrap().image(), None);
    assert_eq!(
        summary.outcome(Stage::Verify).unwrap().status,
        StageStatus::Skipped
    );
    assert_eq!(
        summary.outcome(Stage::Export).unwrap().status,
        StageStatus::Skipped
    );
    assert_eq!(h.calls("run"), 0);
    assert_eq!(h.calls("save"), 0);
    assert_eq!(h.calls("images"), 0);

    // rmi of the never-built image is attempted, fails, and is only noted
    assert_eq!(h.calls("rmi"), 1);
    let cleanup = summary.outcome(Stage::Cleanup).unwrap();
    assert!(cleanup.succeeded());
    assert!(cleanup.notes.iter().any(|n| n.contains("not removed")));

    assert!(!summary.overall_success());
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn size_query_failure_only_warns() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            size_query: false,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let build = summary.outcome(Stage::Build).unwrap();
    assert_eq!(build.status, StageStatus::Passed);
    assert_eq!(build.image(), Some("elixir-lean-vm-test"));
    assert!(
        build
            .notes
            .iter()
            .any(|n| n.contains("image size unavailable"))
    );
    assert_eq!(h.calls("images"), 1);
    assert!(summary.overall_success());
}

// ── Cleanup ──

#[tokio::test]
async fn cleanup_runs_once_when_every_call_fails() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            engine_missing: true,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    assert_eq!(h.calls("rmi"), 1);
    let cleanups = summary
        .outcomes
        .iter()
        .filter(|o| o.stage == Stage::Cleanup)
        .count();
    assert_eq!(cleanups, 1);
    assert!(!summary.overall_success());
    assert!(!h.settings().dockerfile.exists());
}

#[tokio::test]
async fn cleanup_runs_when_generation_fails() {
    let h = Harness::new(Profile::Runtime, Plan::default());
    // a file where the work dir should be
    std::fs::write(&h.settings().work_dir, "blocker").unwrap();

    let mut seen = Vec::new();
    let result = h.pipeline.run_with(|o| seen.push(o.stage)).await;

    assert!(matches!(result, Err(PipelineError::Generate { .. })));
    assert_eq!(seen, [Stage::Cleanup]);
    assert_eq!(h.calls("rmi"), 1);
    assert_eq!(h.calls("build"), 0);
}

// ── Overall success ──

#[tokio::test]
async fn overall_success_is_and_of_build_verify_export() {
    for bits in 0u8..8 {
        let (build, verify, export) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
        let plan = Plan {
            build,
            shell: verify,
            iex: verify.then_some("Hello from IEx!"),
            erl_eval: verify.then_some("Hello from Erlang"),
            archive_bytes: export.then_some(100),
            ..Plan::default()
        };
        let h = Harness::new(Profile::Runtime, plan);

        let summary = h.pipeline.run().await.unwrap();

        let case = format!("build={build} verify={verify} export={export}");
        assert_eq!(summary.passed(Stage::Build), build, "{case}");
        assert_eq!(summary.passed(Stage::Verify), build && verify, "{case}");
        assert_eq!(summary.passed(Stage::Export), build && export, "{case}");
        assert_eq!(
            summary.overall_success(),
            build && verify && export,
            "{case}"
        );
        assert_eq!(h.calls("rmi"), 1, "{case}");
    }
}

// ── Generation ──

#[test]
fn generation_is_idempotent() {
    let h = Harness::new(Profile::App, Plan::default());

    let first = h.pipeline.generate().unwrap();
    let first_bytes = std::fs::read(first.path().unwrap()).unwrap();
    let second = h.pipeline.generate().unwrap();
    let second_bytes = std::fs::read(second.path().unwrap()).unwrap();

    assert_eq!(first.path(), second.path());
    assert_eq!(first_bytes, second_bytes);
}

// ── Verify fallback chain ──

#[tokio::test]
async fn fallback_used_when_primary_fails() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            iex: None,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let verify = summary.outcome(Stage::Verify).unwrap();
    assert!(verify.succeeded());
    assert_eq!(verify.detail, "erl eval succeeded");
    assert!(h.ran("IO.puts"));
    assert!(h.ran("halt()."));
}

#[tokio::test]
async fn fallback_not_tried_when_primary_succeeds() {
    let h = Harness::new(Profile::Runtime, Plan::default());

    h.pipeline.run().await.unwrap();

    assert!(h.ran("IO.puts"));
    assert!(!h.ran("halt()."));
}

#[tokio::test]
async fn verify_fails_when_whole_chain_fails() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            iex: None,
            erl_eval: None,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let verify = summary.outcome(Stage::Verify).unwrap();
    assert_eq!(verify.status, StageStatus::Failed);
    assert_eq!(verify.detail, "every runtime invocation failed");
    // export still runs for diagnostic coverage
    assert!(summary.passed(Stage::Export));
    assert!(!summary.overall_success());
}

#[tokio::test]
async fn unexpected_output_counts_as_failure() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            iex: Some("Goodbye\n"),
            erl_eval: Some("Goodbye\n"),
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let verify = summary.outcome(Stage::Verify).unwrap();
    assert!(!verify.succeeded());
    assert!(verify.notes.iter().any(|n| n.contains("unexpected output")));
}

#[tokio::test]
async fn smoke_test_failure_skips_runtime_chain() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            shell: false,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let verify = summary.outcome(Stage::Verify).unwrap();
    assert_eq!(verify.detail, "basic shell test failed");
    assert!(!h.ran("IO.puts"));
    // listings ran first
    assert!(h.ran("/usr/local/bin/"));
}

#[tokio::test]
async fn app_profile_falls_back_to_shell_start() {
    let h = Harness::new(
        Profile::App,
        Plan {
            release: None,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let verify = summary.outcome(Stage::Verify).unwrap();
    assert!(verify.succeeded());
    assert_eq!(verify.detail, "release start via shell succeeded");
    assert!(summary.overall_success());
    assert!(h.ran("/app/bin"));
}

#[tokio::test]
async fn app_profile_requires_expected_greeting() {
    let h = Harness::new(
        Profile::App,
        Plan {
            release: Some("started\n"),
            release_shell: Some("started\n"),
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    assert!(!summary.passed(Stage::Verify));
}

// ── Export & compression ──

#[tokio::test]
async fn export_succeeds_without_compressor() {
    let h = Harness::new(Profile::Runtime, Plan::default());

    let summary = h.pipeline.run().await.unwrap();

    let export = summary.outcome(Stage::Export).unwrap();
    assert!(export.succeeded());
    assert!(export.notes.iter().any(|n| n.contains("(100 bytes)")));
    assert!(export.notes.iter().any(|n| n.contains("not available")));
    assert!(!h.ran("-9"));
}

#[tokio::test]
async fn export_reports_compression_when_available() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            compressor_on_path: true,
            compressed_bytes: Some(40),
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let export = summary.outcome(Stage::Export).unwrap();
    assert!(export.succeeded());
    assert_eq!(
        export.artifact,
        Some(ArtifactRef::Path(h.settings().compressed_archive()))
    );
    assert!(export.notes.iter().any(|n| n.contains("60.0% reduction")));
    // the compressed sibling is cleaned up too
    assert!(!h.settings().compressed_archive().exists());
}

#[tokio::test]
async fn compression_failure_only_warns() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            compressor_on_path: true,
            compressed_bytes: None,
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let export = summary.outcome(Stage::Export).unwrap();
    assert_eq!(export.status, StageStatus::Passed);
    assert_eq!(
        export.artifact,
        Some(ArtifactRef::Path(h.settings().archive.clone()))
    );
    assert!(export.notes.iter().any(|n| n.contains("compression failed")));
    assert!(h.ran("-9"));
    assert!(summary.overall_success());
}

#[tokio::test]
async fn other_compressor_output_is_reported_and_cleaned_up() {
    let mut config = LeanVmConfig::default();
    config.harness.compressor = "gzip".to_owned();
    let h = Harness::with_config(
        Profile::Runtime,
        &config,
        Plan {
            compressor_on_path: true,
            compressed_bytes: Some(30),
            ..Plan::default()
        },
    );
    let gz = h.settings().archive.with_extension("tar.gz");

    let summary = h.pipeline.run().await.unwrap();

    let export = summary.outcome(Stage::Export).unwrap();
    assert!(export.succeeded());
    assert_eq!(export.artifact, Some(ArtifactRef::Path(gz.clone())));
    assert!(export.notes.iter().any(|n| n.contains("70.0% reduction")));
    assert!(summary.overall_success());
    assert!(!gz.exists(), "{} left behind", gz.display());
}

#[tokio::test]
async fn export_fails_on_empty_archive() {
    let h = Harness::new(
        Profile::Runtime,
        Plan {
            archive_bytes: Some(0),
            ..Plan::default()
        },
    );

    let summary = h.pipeline.run().await.unwrap();

    let export = summary.outcome(Stage::Export).unwrap();
    assert_eq!(export.status, StageStatus::Failed);
    assert!(export.detail.contains("is empty"));
    assert!(!summary.overall_success());
}

#[tokio::test]
async fn clean_alone_removes_leftovers() {
    let h = Harness::new(Profile::Runtime, Plan::default());
    std::fs::create_dir_all(&h.settings().work_dir).unwrap();
    std::fs::write(&h.settings().archive, "stale").unwrap();

    let outcome = h.pipeline.clean().await;

    assert!(outcome.succeeded());
    assert!(!h.settings().archive.exists());
    assert_eq!(h.calls("rmi"), 1);
}
