use leanvm_build::artifacts;
use leanvm_core::PipelineSettings;
use leanvm_docker::{CommandExecutor, DockerClient};

use crate::outcome::{Stage, StageOutcome};

/// Remove the image and every generated file.
///
/// Always attempts all removals. Nothing here is propagated: a failure only
/// marks the cleanup outcome, which does not count toward overall success.
/// The image may not exist (failed build); the engine's complaint is noted.
pub async fn cleanup<E: CommandExecutor>(
    client: &DockerClient<E>,
    settings: &PipelineSettings,
) -> StageOutcome {
    let tag = settings.image_tag.as_str();
    let mut notes = Vec::new();
    let mut clean = true;

    match client.remove_image(tag).await {
        Ok(output) if output.success() => notes.push(format!("removed image {tag}")),
        Ok(output) => {
            tracing::info!(stage = "cleanup", tag, status = output.status, "image not removed");
            notes.push(format!("image {tag} not removed: {}", output.stderr.trim()));
        }
        Err(e) => {
            tracing::warn!(stage = "cleanup", tag, error = %e, "image removal failed");
            notes.push(format!("image {tag} not removed: {e}"));
            clean = false;
        }
    }

    for path in settings.artifact_paths() {
        match artifacts::remove_artifact(&path) {
            Ok(true) => notes.push(format!("cleaned up {}", path.display())),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    stage = "cleanup",
                    path = %path.display(),
                    error = %e,
                    "could not remove artifact"
                );
                notes.push(e.to_string());
                clean = false;
            }
        }
    }

    if clean {
        StageOutcome::passed(Stage::Cleanup, "artifacts removed").with_notes(notes)
    } else {
        StageOutcome::failed(Stage::Cleanup, "some artifacts could not be removed")
            .with_notes(notes)
    }
}
