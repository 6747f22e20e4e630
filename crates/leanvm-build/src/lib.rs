//! Dockerfile generation and work-dir artifact handling for leanvm.
//!
//! # Generated Dockerfile
//!
//! ```text
//! Stage 1: builder  ── elixir:<ver>-alpine, build deps (+ mix release for `app`)
//! Stage 2: runtime  ── alpine:<ver>, runtime libs, Erlang/Elixir copied from builder
//! Stage 3: export   ── scratch, whole runtime filesystem
//! ```
//!
//! The template is fixed; the only inputs are values from
//! [`leanvm_core::ImageConfig`] and [`leanvm_core::AppConfig`], so rendering
//! the same profile twice always yields the same bytes.

pub mod artifacts;
pub mod dockerfile;

pub use artifacts::ArtifactError;
pub use dockerfile::DockerfileGenerator;
