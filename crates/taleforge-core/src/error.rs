//! Error taxonomy for provider calls and orchestration.

use std::time::Duration;

use thiserror::Error;

use crate::tier::{Modality, Tier};

/// A failure reported by a provider, either while it is being constructed or
/// while it serves a modality call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The call or construction did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The backend rejected the call for quota or rate reasons.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The backend could not be reached or answered with a server error.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Credentials required to construct the provider are absent.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// A model artifact required to construct the provider is absent.
    #[error("missing model artifact: {0}")]
    MissingArtifact(String),

    /// The provider does not implement the requested capability on this
    /// platform.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Any other provider-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Top-level orchestration error type.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Unrecognized mode token or invalid setting. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A tier could not be constructed.
    #[error("provider initialization failed for tier {tier}: {source}")]
    ProviderInitialization {
        /// The tier whose construction failed.
        tier: Tier,
        /// The underlying construction failure.
        #[source]
        source: ProviderError,
    },

    /// A modality call failed on a constructed tier.
    #[error("{modality} generation failed on tier {tier}: {source}")]
    ProviderGeneration {
        /// The tier that served the call.
        tier: Tier,
        /// The modality being generated.
        modality: Modality,
        /// The underlying call failure.
        #[source]
        source: ProviderError,
    },

    /// No remaining tier could satisfy a modality.
    #[error("no tier could satisfy {modality} after {attempts} attempt(s)")]
    ChainExhausted {
        /// The modality left unsatisfied.
        modality: Modality,
        /// How many tiers were attempted before giving up.
        attempts: u32,
    },

    /// The request itself is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller-level deadline elapsed and in-flight calls were cancelled.
    #[error("request deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}
