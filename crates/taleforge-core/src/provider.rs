//! Provider contracts and the tier-to-factory table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::request::GenerationRequest;
use crate::tier::{Capabilities, Tier};

/// A constructed, tier-bound generation backend.
///
/// Implementations must be safe for concurrent invocation: the orchestrator
/// shares one instance per tier across every in-flight request and takes no
/// lock around these calls. CPU-bound implementations are expected to offload
/// to their own worker pool.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// The tier this instance belongs to.
    fn tier(&self) -> Tier;

    /// Modalities this instance can serve.
    fn capabilities(&self) -> Capabilities;

    /// Generates the story text for a request.
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, ProviderError>;

    /// Narrates `text`, returning the audio location.
    async fn synthesize_narration(
        &self,
        _text: &str,
        _request: &GenerationRequest,
        _voice: Option<&str>,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported(format!(
            "tier {} does not narrate",
            self.tier()
        )))
    }

    /// Produces up to `count` frames illustrating `text`.
    async fn create_frames(
        &self,
        text: &str,
        request: &GenerationRequest,
        count: u32,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Builds the provider for one tier.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Constructs the provider, validating connection parameters once.
    async fn construct(&self) -> Result<Arc<dyn Provider>, ProviderError>;
}

/// Maps each tier to the factory that builds it.
#[derive(Clone, Default)]
pub struct ProviderTable {
    factories: HashMap<Tier, Arc<dyn ProviderFactory>>,
}

impl ProviderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `tier`, replacing any earlier registration.
    #[must_use]
    pub fn with(mut self, tier: Tier, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factories.insert(tier, factory);
        self
    }

    /// The factory registered for `tier`.
    #[must_use]
    pub fn get(&self, tier: Tier) -> Option<Arc<dyn ProviderFactory>> {
        self.factories.get(&tier).cloned()
    }

    /// Tiers with a registered factory.
    #[must_use]
    pub fn tiers(&self) -> Vec<Tier> {
        let mut tiers: Vec<Tier> = self.factories.keys().copied().collect();
        tiers.sort();
        tiers
    }
}

impl fmt::Debug for ProviderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTable")
            .field("tiers", &self.tiers())
            .finish()
    }
}
