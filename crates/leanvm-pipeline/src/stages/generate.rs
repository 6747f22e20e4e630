use leanvm_build::{DockerfileGenerator, artifacts};
use leanvm_core::PipelineSettings;

use crate::error::PipelineError;
use crate::outcome::{ArtifactRef, Stage, StageOutcome};

/// Render the profile's Dockerfile and write it into the work directory.
///
/// Only a filesystem failure makes this stage fail, and that is reported as
/// an error rather than an outcome: nothing after it can run.
pub fn generate(settings: &PipelineSettings) -> Result<StageOutcome, PipelineError> {
    let content =
        DockerfileGenerator::new(&settings.images, &settings.app, settings.profile).render();

    let path = artifacts::write_dockerfile(
        &settings.work_dir,
        settings.profile.dockerfile_name(),
        &content,
    )
    .map_err(|e| PipelineError::Generate { source: e })?;

    tracing::info!(stage = "generate", path = %path.display(), "dockerfile generated");

    Ok(
        StageOutcome::passed(Stage::Generate, &format!("generated {}", path.display()))
            .with_artifact(ArtifactRef::Path(path)),
    )
}
