//! Shared test mocks and utilities for the Taleforge generation engine.

mod clock;
mod factory;
mod provider;
mod sink;

pub use clock::FixedClock;
pub use factory::{FailingFactory, ScriptedFactory};
pub use provider::{Script, ScriptedProvider};
pub use sink::RecordingSink;
