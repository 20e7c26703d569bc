//! Taleforge Core: shared orchestration abstractions.
//!
//! This crate defines the tiers, policies, provider contracts and error
//! taxonomy that the orchestrator and every provider family depend on. It
//! contains no network or model code.

pub mod config;
pub mod error;
pub mod event;
pub mod policy;
pub mod provider;
pub mod request;
pub mod tier;
