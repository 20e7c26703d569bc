//! Orchestrator settings, read once at startup.

use std::time::Duration;

use crate::error::GenerationError;

/// Environment variable holding the mode token.
pub const MODE_VAR: &str = "TALEFORGE_MODE";
/// Environment variable naming a file whose contents replace the mode token
/// on reload.
pub const MODE_FILE_VAR: &str = "TALEFORGE_MODE_FILE";
/// Environment variable holding the per-call timeout in seconds.
pub const CALL_TIMEOUT_VAR: &str = "TALEFORGE_CALL_TIMEOUT_SECS";
/// Environment variable holding the per-construction timeout in seconds.
pub const CONSTRUCT_TIMEOUT_VAR: &str = "TALEFORGE_CONSTRUCT_TIMEOUT_SECS";
/// Environment variable holding the caller-level deadline in seconds.
pub const REQUEST_TIMEOUT_VAR: &str = "TALEFORGE_REQUEST_TIMEOUT_SECS";

/// Settings passed explicitly to the orchestrator at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Mode token, resolved by `policy::resolve_mode`.
    pub mode: String,
    /// Bound on every provider call.
    pub call_timeout: Duration,
    /// Bound on every tier construction.
    pub construct_timeout: Duration,
    /// Caller-level deadline for a whole request.
    pub request_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            mode: "remote_first".to_owned(),
            call_timeout: Duration::from_secs(30),
            construct_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl OrchestratorSettings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`OrchestratorSettings::from_lookup`].
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for absent
    /// keys. The mode token is not validated here; that is the resolver's job.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Configuration` if a timeout is not a positive
    /// integer number of seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            mode: lookup(MODE_VAR).unwrap_or(defaults.mode),
            call_timeout: seconds(&lookup, CALL_TIMEOUT_VAR, defaults.call_timeout)?,
            construct_timeout: seconds(&lookup, CONSTRUCT_TIMEOUT_VAR, defaults.construct_timeout)?,
            request_timeout: seconds(&lookup, REQUEST_TIMEOUT_VAR, defaults.request_timeout)?,
        })
    }
}

fn seconds<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, GenerationError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(GenerationError::Configuration(format!(
            "{key} must be a positive number of seconds, got '{raw}'"
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}
