use leanvm_build::artifacts::{self, mebibytes, reduction_percent};
use leanvm_core::PipelineSettings;
use leanvm_docker::{CommandExecutor, DockerClient};

use crate::outcome::{ArtifactRef, Stage, StageOutcome};

/// Save the image to a tar archive, then compress it if the compressor is
/// on PATH.
///
/// Pass/fail depends on the archive alone: it must exist and be non-empty.
/// The artifact is the compressed file when one was produced, otherwise the
/// plain archive.
pub async fn export<E: CommandExecutor>(
    client: &DockerClient<E>,
    settings: &PipelineSettings,
    image: Option<&str>,
) -> StageOutcome {
    let Some(tag) = image else {
        return StageOutcome::skipped(Stage::Export, "no image to export");
    };
    let archive = &settings.archive;

    if let Err(e) = client.save_image(tag, archive).await {
        tracing::error!(stage = "export", tag, error = %e, "docker save failed");
        return StageOutcome::failed(Stage::Export, &format!("save failed: {e}"));
    }

    let archive_bytes = match artifacts::file_size(archive) {
        Ok(Some(bytes)) if bytes > 0 => bytes,
        Ok(Some(_)) => {
            return StageOutcome::failed(
                Stage::Export,
                &format!("{} is empty", archive.display()),
            );
        }
        Ok(None) => {
            return StageOutcome::failed(
                Stage::Export,
                &format!("{} was not created", archive.display()),
            );
        }
        Err(e) => {
            tracing::error!(stage = "export", error = %e, "cannot stat archive");
            return StageOutcome::failed(Stage::Export, &e.to_string());
        }
    };

    let mut notes = vec![format!(
        "exported size: {:.2} MB ({archive_bytes} bytes)",
        mebibytes(archive_bytes)
    )];
    let mut artifact = archive.clone();

    match client.locate(&settings.compressor) {
        None => {
            tracing::warn!(
                compressor = %settings.compressor,
                "compressor not available, skipping compression"
            );
            notes.push(format!("{} not available for compression", settings.compressor));
        }
        Some(_) => match client.compress(&settings.compressor, archive).await {
            Err(e) => {
                tracing::warn!(stage = "export", error = %e, "compression failed");
                notes.push(format!("compression failed: {e}"));
            }
            Ok(()) => {
                let compressed = settings.compressed_archive();
                match artifacts::file_size(&compressed) {
                    Ok(Some(bytes)) => {
                        notes.push(format!(
                            "compressed to {}: {:.2} MB ({:.1}% reduction)",
                            compressed.display(),
                            mebibytes(bytes),
                            reduction_percent(archive_bytes, bytes)
                        ));
                        artifact = compressed;
                    }
                    Ok(None) => notes.push("compressor produced no output file".to_owned()),
                    Err(e) => {
                        tracing::warn!(
                            stage = "export",
                            error = %e,
                            "cannot stat compressed archive"
                        );
                        notes.push(e.to_string());
                    }
                }
            }
        },
    }

    tracing::info!(stage = "export", path = %artifact.display(), "image exported");
    StageOutcome::passed(Stage::Export, &format!("exported to {}", archive.display()))
        .with_artifact(ArtifactRef::Path(artifact))
        .with_notes(notes)
}
