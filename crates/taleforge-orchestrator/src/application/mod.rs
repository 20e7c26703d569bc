//! Application services: provider registry, startup bootstrap, runtime
//! fallback and the request-level coordinator.

pub mod bootstrap;
pub mod coordinator;
pub mod fallback;
pub mod orchestrator;
pub mod registry;
