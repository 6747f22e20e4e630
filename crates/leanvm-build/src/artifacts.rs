use std::path::{Path, PathBuf};

/// Writes the generated Dockerfile into the work directory, creating the
/// directory when it does not exist yet. Existing content is replaced.
pub fn write_dockerfile(
    work_dir: &Path,
    file_name: &str,
    content: &str,
) -> Result<PathBuf, ArtifactError> {
    std::fs::create_dir_all(work_dir).map_err(|e| ArtifactError::CreateDir {
        path: work_dir.to_path_buf(),
        source: e,
    })?;

    let path = work_dir.join(file_name);
    std::fs::write(&path, content).map_err(|e| ArtifactError::Write {
        path: path.clone(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote dockerfile");
    Ok(path)
}

/// Size of an artifact on disk, `None` if it does not exist.
pub fn file_size(path: &Path) -> Result<Option<u64>, ArtifactError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ArtifactError::Stat {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Deletes an artifact. Returns `false` when there was nothing to delete.
pub fn remove_artifact(path: &Path) -> Result<bool, ArtifactError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ArtifactError::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Bytes as mebibytes, for reports.
pub fn mebibytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Percentage saved by compression; 0 when the original is empty.
pub fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / original as f64) * 100.0
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to create work directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to stat {path}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove {path}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}
