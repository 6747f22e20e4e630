//! Build-and-verify orchestration for leanvm.
//!
//! ```text
//! Pipeline::run
//!   1. Generate ── DockerfileGenerator::render() → <work_dir>/Dockerfile[.app]
//!   2. Build    ── <engine> build -t <tag>, then <engine> images for the size
//!   3. Verify   ── listings, shell smoke test, runtime fallback chain
//!   4. Export   ── <engine> save -o <archive>, then xz -9 -k if available
//!   5. Cleanup  ── <engine> rmi <tag>, delete generated files (always runs)
//! ```
//!
//! Stages never stop the pipeline: a failed stage yields a failed
//! [`StageOutcome`] and later stages that need its artifact are skipped.
//! Only a generation failure ends the run early, after cleanup.

pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod stages;

pub use error::PipelineError;
pub use orchestrator::Pipeline;
pub use outcome::{ArtifactRef, RunSummary, Stage, StageOutcome, StageStatus};
