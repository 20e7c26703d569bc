//! Taleforge: HTTP-backed providers for the remote, local and edge tiers.
//!
//! Each tier is served by an [`http::HttpProvider`] built by that tier's
//! factory from `TALEFORGE_<TIER>_*` settings.

pub mod factory;
pub mod http;
pub mod settings;

pub use factory::{
    EdgeFactory, LocalFactory, RemoteFactory, provider_table_from_env, provider_table_from_lookup,
};
pub use http::HttpProvider;
pub use settings::TierSettings;
