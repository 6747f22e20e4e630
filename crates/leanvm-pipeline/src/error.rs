use leanvm_build::ArtifactError;

/// Conditions no stage can turn into a plain failed outcome.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to generate Dockerfile")]
    Generate { source: ArtifactError },
}
