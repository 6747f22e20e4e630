pub mod client;
pub mod error;
pub mod executor;

pub use client::{CheckResult, DockerClient, DockerError, DoctorReport};
pub use error::ExecError;
pub use executor::{CommandExecutor, CommandOutput, ExitPolicy, Invocation, RealExecutor};
