use std::path::Path;
use std::process::ExitCode;

use leanvm_core::Profile;

const RULE_WIDTH: usize = 50;

pub async fn run(project_dir: &Path, profile: Profile, json: bool) -> anyhow::Result<ExitCode> {
    let pipeline = super::load_pipeline(project_dir, profile)?;

    println!("Testing Alpine Docker builder ({profile} profile)...");
    println!("{}", "=".repeat(RULE_WIDTH));

    let summary = match pipeline.run_with(|outcome| println!("{outcome}")).await {
        Ok(summary) => summary,
        Err(e) => {
            let e = anyhow::Error::from(e);
            tracing::error!(error = %format!("{e:#}"), "pipeline aborted");
            return Ok(ExitCode::FAILURE);
        }
    };

    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{summary}");

    if json {
        let report = serde_json::json!({
            "profile": summary.profile,
            "success": summary.overall_success(),
            "stages": summary.outcomes,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(ExitCode::from(summary.exit_code()))
}
