use leanvm_core::{PipelineSettings, Probe};
use leanvm_docker::{CommandExecutor, DockerClient};

use crate::outcome::{Stage, StageOutcome};

/// Run the listings, the shell smoke test, diagnostics, then the runtime
/// fallback chain.
///
/// Passes when the smoke test passes and at least one probe of the chain
/// passes. Every probe is judged by [`Probe::accepts`].
pub async fn verify<E: CommandExecutor>(
    client: &DockerClient<E>,
    settings: &PipelineSettings,
    image: Option<&str>,
) -> StageOutcome {
    let Some(tag) = image else {
        return StageOutcome::skipped(Stage::Verify, "no image to run");
    };
    let mut notes = Vec::new();

    for probe in &settings.listings {
        let report = run_probe(client, settings, tag, probe).await;
        notes.push(report.note);
    }

    let smoke = run_probe(client, settings, tag, &settings.smoke_test).await;
    notes.push(smoke.note);
    if !smoke.passed {
        tracing::error!(stage = "verify", tag, "basic shell test failed");
        return StageOutcome::failed(Stage::Verify, "basic shell test failed").with_notes(notes);
    }

    for probe in &settings.diagnostics {
        let report = run_probe(client, settings, tag, probe).await;
        notes.push(report.note);
    }

    for (attempt, probe) in settings.fallback_chain.iter().enumerate() {
        if attempt > 0 {
            tracing::info!(stage = "verify", probe = %probe.label, "trying alternative invocation");
        }
        let report = run_probe(client, settings, tag, probe).await;
        notes.push(report.note);
        if report.passed {
            tracing::info!(stage = "verify", tag, probe = %probe.label, "runtime verified");
            return StageOutcome::passed(Stage::Verify, &format!("{} succeeded", probe.label))
                .with_notes(notes);
        }
    }

    tracing::error!(stage = "verify", tag, "every runtime invocation failed");
    StageOutcome::failed(Stage::Verify, "every runtime invocation failed").with_notes(notes)
}

struct ProbeReport {
    passed: bool,
    note: String,
}

async fn run_probe<E: CommandExecutor>(
    client: &DockerClient<E>,
    settings: &PipelineSettings,
    tag: &str,
    probe: &Probe,
) -> ProbeReport {
    let output = match client
        .run_in_image(tag, &probe.command, settings.interactive)
        .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(probe = %probe.label, error = %e, "probe could not run");
            return ProbeReport {
                passed: false,
                note: format!("{}: could not run: {e}", probe.label),
            };
        }
    };

    let passed = probe.accepts(output.success(), &output.stdout);
    let note = if passed {
        format!("{}: {}", probe.label, output.stdout.trim())
    } else if !output.success() {
        format!(
            "{}: exit status {}: {}",
            probe.label,
            output.status,
            output.stderr.trim()
        )
    } else {
        format!(
            "{}: unexpected output (wanted {:?}): {}",
            probe.label,
            probe.expect.as_deref().unwrap_or_default(),
            output.stdout.trim()
        )
    };
    tracing::debug!(probe = %probe.label, status = output.status, passed, "probe finished");

    ProbeReport { passed, note }
}
