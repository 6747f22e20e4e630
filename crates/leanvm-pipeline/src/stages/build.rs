use std::path::Path;

use leanvm_core::PipelineSettings;
use leanvm_docker::{CommandExecutor, DockerClient};

use crate::outcome::{ArtifactRef, Stage, StageOutcome};

/// Build and tag the image. The size lookup afterwards is informational.
pub async fn build<E: CommandExecutor>(
    client: &DockerClient<E>,
    settings: &PipelineSettings,
    dockerfile: Option<&Path>,
) -> StageOutcome {
    let Some(dockerfile) = dockerfile else {
        return StageOutcome::skipped(Stage::Build, "no Dockerfile to build");
    };
    let tag = settings.image_tag.as_str();

    if let Err(e) = client
        .build_image(&settings.context_dir, dockerfile, tag)
        .await
    {
        tracing::error!(stage = "build", tag, error = %e, "docker build failed");
        return StageOutcome::failed(Stage::Build, &format!("build of {tag} failed: {e}"));
    }

    let mut notes = Vec::new();
    match client.image_size(tag).await {
        Ok(size) => notes.push(format!("image size: {size}")),
        Err(e) => {
            tracing::warn!(stage = "build", tag, error = %e, "could not read image size");
            notes.push(format!("image size unavailable: {e}"));
        }
    }

    tracing::info!(stage = "build", tag, "image built");
    StageOutcome::passed(Stage::Build, &format!("built {tag}"))
        .with_artifact(ArtifactRef::Image(tag.to_owned()))
        .with_notes(notes)
}
