//! Pure orchestration rules: health states, the per-modality walk state
//! machine, terminal modality behavior and the placeholder renderer.

pub mod health;
pub mod modality_policy;
pub mod placeholder;
pub mod walk;
