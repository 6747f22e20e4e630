//! One function per pipeline stage.
//!
//! Each stage takes the artifact of its predecessor as an `Option` and
//! returns a [`StageOutcome`](crate::StageOutcome). A missing artifact means
//! "skip": no external command is run.

mod build;
mod cleanup;
mod export;
mod generate;
mod verify;

pub use build::build;
pub use cleanup::cleanup;
pub use export::export;
pub use generate::generate;
pub use verify::verify;
