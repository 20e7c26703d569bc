//! Startup bootstrap: find the first usable tier of the policy chain.

use std::sync::Arc;

use taleforge_core::error::GenerationError;
use taleforge_core::policy::FallbackPolicy;
use taleforge_core::provider::Provider;
use taleforge_core::tier::{Modality, Tier};
use tracing::{error, info, warn};

use crate::application::registry::ProviderRegistry;

/// Outcome of a successful bootstrap.
#[derive(Debug)]
pub struct BootstrapReport {
    /// The happy-path default tier.
    pub tier: Tier,
    /// Its constructed provider.
    pub provider: Arc<dyn Provider>,
    /// Tiers passed over on the way, with the reason.
    pub skipped: Vec<(Tier, String)>,
}

/// Walks `policy` in order and returns the first tier that constructs and
/// serves text, the one modality with no degraded form.
///
/// # Errors
///
/// Returns `GenerationError::ChainExhausted` if no candidate qualifies. The
/// caller should refuse to serve requests.
pub async fn bootstrap(
    registry: &ProviderRegistry,
    policy: &FallbackPolicy,
) -> Result<BootstrapReport, GenerationError> {
    let mut skipped = Vec::new();
    for &tier in policy.candidates() {
        match registry.get_or_init(tier).await {
            Ok(provider) if provider.capabilities().supports(Modality::Text) => {
                info!(
                    mode = %policy.mode(),
                    tier = %tier,
                    skipped = skipped.len(),
                    "bootstrap selected default tier"
                );
                return Ok(BootstrapReport {
                    tier,
                    provider,
                    skipped,
                });
            }
            Ok(_) => {
                warn!(tier = %tier, "tier constructed but does not generate text");
                skipped.push((tier, "does not generate text".to_owned()));
            }
            Err(err) => {
                warn!(tier = %tier, error = %err, "tier unavailable at bootstrap");
                skipped.push((tier, err.to_string()));
            }
        }
    }

    error!(mode = %policy.mode(), "no tier in the chain could be initialized");
    Err(GenerationError::ChainExhausted {
        modality: Modality::Text,
        attempts: u32::try_from(skipped.len()).unwrap_or(u32::MAX),
    })
}
