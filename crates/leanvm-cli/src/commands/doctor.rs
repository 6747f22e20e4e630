use std::path::Path;
use std::process::ExitCode;

use leanvm_core::LeanVmConfig;
use leanvm_core::config::CONFIG_FILE_NAME;
use leanvm_docker::{CheckResult, DockerClient};

pub async fn doctor(project_dir: &Path) -> anyhow::Result<ExitCode> {
    // an unreadable leanvm.toml is a finding, not a reason to skip the other checks
    let (config, config_check) = match LeanVmConfig::load(project_dir) {
        Ok(config) if project_dir.join(CONFIG_FILE_NAME).exists() => {
            (config, CheckResult::ok("Found"))
        }
        Ok(config) => (config, CheckResult::fail("Not found (using defaults)")),
        Err(e) => {
            tracing::warn!(error = %e, "config unusable, checking with defaults");
            (
                LeanVmConfig::default(),
                CheckResult::fail(&format!("{e} (using defaults)")),
            )
        }
    };

    let client = DockerClient::new().with_engine(&config.harness.engine);
    let mut report = client.doctor(&config.harness.compressor).await;
    report.config_file = config_check;

    println!();
    println!("{report}");

    if !report.required_passed() {
        anyhow::bail!("required checks failed — see above for details");
    }

    Ok(ExitCode::SUCCESS)
}
