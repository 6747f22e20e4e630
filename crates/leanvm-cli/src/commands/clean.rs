use std::path::Path;
use std::process::ExitCode;

use leanvm_core::Profile;

pub async fn clean(project_dir: &Path, profile: Profile) -> anyhow::Result<ExitCode> {
    let pipeline = super::load_pipeline(project_dir, profile)?;
    let outcome = pipeline.clean().await;

    println!("{outcome}");
    if !outcome.succeeded() {
        anyhow::bail!("cleanup incomplete — see above for details");
    }
    Ok(ExitCode::SUCCESS)
}
