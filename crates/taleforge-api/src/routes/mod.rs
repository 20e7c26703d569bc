//! Route modules.

pub mod health;
pub mod providers;
pub mod stories;
