//! Taleforge: tiered generation orchestration bounded context.
//!
//! Routes one creative-content request (story text, narration, frames)
//! across the remote, local and edge tiers named by a `FallbackPolicy`,
//! recovering from construction and call failures tier by tier and degrading
//! optional modalities instead of failing the request.

pub mod application;
pub mod domain;

pub use application::orchestrator::Orchestrator;
