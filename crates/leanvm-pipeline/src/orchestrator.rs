use leanvm_core::PipelineSettings;
use leanvm_docker::{CommandExecutor, DockerClient, RealExecutor};

use crate::error::PipelineError;
use crate::outcome::{RunSummary, StageOutcome};
use crate::stages;

/// Runs the stages in fixed order against one container engine client.
pub struct Pipeline<E: CommandExecutor = RealExecutor> {
    settings: PipelineSettings,
    client: DockerClient<E>,
}

impl<E: CommandExecutor> Pipeline<E> {
    pub fn new(settings: PipelineSettings, client: DockerClient<E>) -> Self {
        Self { settings, client }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        self.run_with(|_| {}).await
    }

    /// Run every stage, calling `on_stage` as each one completes.
    ///
    /// Cleanup runs exactly once per call, whatever happened before it. The
    /// only `Err` is a generation failure, returned after cleanup.
    pub async fn run_with<F>(&self, mut on_stage: F) -> Result<RunSummary, PipelineError>
    where
        F: FnMut(&StageOutcome),
    {
        let settings = &self.settings;
        let mut summary = RunSummary::new(settings.profile);

        tracing::info!(
            profile = %settings.profile,
            tag = %settings.image_tag,
            work_dir = %settings.work_dir.display(),
            "starting pipeline"
        );

        let generated = match stages::generate(settings) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "generation failed; cleaning up before aborting");
                let cleanup = stages::cleanup(&self.client, settings).await;
                on_stage(&cleanup);
                return Err(e);
            }
        };
        on_stage(&generated);
        let dockerfile = generated.path().map(ToOwned::to_owned);
        summary.push(generated);

        let built = stages::build(&self.client, settings, dockerfile.as_deref()).await;
        on_stage(&built);
        let image = built.image().map(ToOwned::to_owned);
        summary.push(built);

        let verified = stages::verify(&self.client, settings, image.as_deref()).await;
        on_stage(&verified);
        summary.push(verified);

        let exported = stages::export(&self.client, settings, image.as_deref()).await;
        on_stage(&exported);
        summary.push(exported);

        let cleaned = stages::cleanup(&self.client, settings).await;
        on_stage(&cleaned);
        summary.push(cleaned);

        tracing::info!(
            profile = %settings.profile,
            success = summary.overall_success(),
            "pipeline finished"
        );
        Ok(summary)
    }

    /// Cleanup on its own, for `leanvm clean`.
    pub async fn clean(&self) -> StageOutcome {
        stages::cleanup(&self.client, &self.settings).await
    }

    /// Generation on its own, for `leanvm generate`.
    pub fn generate(&self) -> Result<StageOutcome, PipelineError> {
        stages::generate(&self.settings)
    }
}
