//! Core types and configuration for leanvm.
//!
//! This crate defines the `leanvm.toml` schema ([`LeanVmConfig`]),
//! the two build [`Profile`]s, the fully resolved [`PipelineSettings`]
//! handed to the orchestrator, and shared error types.

pub mod config;
pub mod error;
pub mod profile;
pub mod settings;

pub use config::{AppConfig, HarnessConfig, ImageConfig, LeanVmConfig};
pub use error::{Error, Result};
pub use profile::Profile;
pub use settings::{PipelineSettings, Probe};
