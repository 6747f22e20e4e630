mod clean;
mod doctor;
mod generate;
mod run;

use std::path::Path;

use leanvm_core::{LeanVmConfig, PipelineSettings, Profile};
use leanvm_docker::DockerClient;
use leanvm_pipeline::Pipeline;

pub use clean::clean;
pub use doctor::doctor;
pub use generate::generate;
pub use run::run;

/// Load leanvm.toml and resolve the pipeline for `profile`.
pub(crate) fn load_pipeline(project_dir: &Path, profile: Profile) -> anyhow::Result<Pipeline> {
    let config = LeanVmConfig::load(project_dir)?;
    let settings = PipelineSettings::resolve(&config, profile, project_dir)?;
    let client = DockerClient::new().with_engine(&settings.engine);
    Ok(Pipeline::new(settings, client))
}
