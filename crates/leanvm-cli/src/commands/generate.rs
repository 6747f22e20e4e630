use std::path::Path;
use std::process::ExitCode;

use leanvm_core::Profile;

pub fn generate(project_dir: &Path, profile: Profile) -> anyhow::Result<ExitCode> {
    let pipeline = super::load_pipeline(project_dir, profile)?;
    let outcome = pipeline.generate()?;

    println!("{outcome}");
    Ok(ExitCode::SUCCESS)
}
