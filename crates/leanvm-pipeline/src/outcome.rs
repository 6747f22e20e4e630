use std::fmt;
use std::path::{Path, PathBuf};

use leanvm_core::Profile;
use serde::Serialize;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generate,
    Build,
    Verify,
    Export,
    Cleanup,
}

impl Stage {
    /// Stages whose success decides the overall result.
    pub const REQUIRED: [Stage; 3] = [Stage::Build, Stage::Verify, Stage::Export];

    pub fn label(self) -> &'static str {
        match self {
            Self::Generate => "Dockerfile generation",
            Self::Build => "Docker build",
            Self::Verify => "Run/verify",
            Self::Export => "Export",
            Self::Cleanup => "Cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Passed,
    Failed,
    /// Not attempted because a predecessor produced no artifact.
    Skipped,
}

impl StageStatus {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Passed => "OK",
            Self::Failed => "NG",
            Self::Skipped => "--",
        }
    }
}

/// Handle produced by one stage and consumed by a later one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArtifactRef {
    Path(PathBuf),
    Image(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    pub detail: String,
    pub artifact: Option<ArtifactRef>,
    /// Diagnostic text gathered while the stage ran.
    pub notes: Vec<String>,
}

impl StageOutcome {
    pub fn passed(stage: Stage, detail: &str) -> Self {
        Self::with_status(stage, StageStatus::Passed, detail)
    }

    pub fn failed(stage: Stage, detail: &str) -> Self {
        Self::with_status(stage, StageStatus::Failed, detail)
    }

    pub fn skipped(stage: Stage, detail: &str) -> Self {
        Self::with_status(stage, StageStatus::Skipped, detail)
    }

    fn with_status(stage: Stage, status: StageStatus, detail: &str) -> Self {
        Self {
            stage,
            status,
            detail: detail.to_owned(),
            artifact: None,
            notes: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, artifact: ArtifactRef) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn succeeded(&self) -> bool {
        self.status == StageStatus::Passed
    }

    /// Produced path, only if the stage passed.
    pub fn path(&self) -> Option<&Path> {
        match (&self.artifact, self.succeeded()) {
            (Some(ArtifactRef::Path(p)), true) => Some(p.as_path()),
            _ => None,
        }
    }

    /// Produced image tag, only if the stage passed.
    pub fn image(&self) -> Option<&str> {
        match (&self.artifact, self.succeeded()) {
            (Some(ArtifactRef::Image(tag)), true) if !tag.is_empty() => Some(tag.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status.icon(), self.stage, self.detail)?;
        for note in &self.notes {
            for line in note.lines() {
                write!(f, "\n       {line}")?;
            }
        }
        Ok(())
    }
}

/// Pass/fail record of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub profile: Profile,
    pub outcomes: Vec<StageOutcome>,
}

impl RunSummary {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: StageOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| o.stage == stage)
    }

    pub fn passed(&self, stage: Stage) -> bool {
        self.outcome(stage).is_some_and(StageOutcome::succeeded)
    }

    /// Build, verify, and export all passed.
    pub fn overall_success(&self) -> bool {
        Stage::REQUIRED.iter().all(|stage| self.passed(*stage))
    }

    /// Process exit status: 0 on overall success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.overall_success() { 0 } else { 1 }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test summary ({} profile):", self.profile)?;
        for outcome in &self.outcomes {
            writeln!(f, "  {:<22} {}", outcome.stage.label(), outcome.status.icon())?;
        }
        writeln!(f)?;
        if self.overall_success() {
            write!(f, "All checks passed. The Alpine builder is functional.")
        } else {
            write!(f, "Some checks failed. See the output above.")
        }
    }
}
