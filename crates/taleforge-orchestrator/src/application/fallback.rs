//! Runtime fallback: walk the policy chain for one modality call.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use taleforge_core::error::{GenerationError, ProviderError};
use taleforge_core::event::{Telemetry, Transition, TransitionKind};
use taleforge_core::policy::FallbackPolicy;
use taleforge_core::provider::Provider;
use taleforge_core::tier::{Modality, Tier};
use uuid::Uuid;

use crate::application::registry::ProviderRegistry;
use crate::domain::walk::ModalityWalk;

/// Outcome of one modality walk.
#[derive(Debug)]
pub struct Resolution<T> {
    /// The winning tier and its output; `None` once the chain is exhausted.
    pub outcome: Option<(Tier, T)>,
    /// Tiers attempted, counting failed constructions.
    pub attempts: u32,
    /// Every failure met on the way, in order.
    pub failures: Vec<GenerationError>,
    primary: Option<Tier>,
}

impl<T> Resolution<T> {
    /// Whether the modality was served by anything other than the first
    /// tier of the chain. A tier skipped because an earlier request already
    /// failed it still counts. On exhaustion, whether more than one tier was
    /// attempted.
    #[must_use]
    pub fn fallback_occurred(&self) -> bool {
        match &self.outcome {
            Some((tier, _)) => self.attempts > 1 || Some(*tier) != self.primary,
            None => self.attempts > 1,
        }
    }
}

/// Walks the not-yet-tried tiers of a policy for a failing modality.
#[derive(Debug, Clone)]
pub struct RuntimeFallbackCoordinator {
    registry: Arc<ProviderRegistry>,
    call_timeout: Duration,
    telemetry: Telemetry,
}

impl RuntimeFallbackCoordinator {
    /// Creates a coordinator bounding every provider call by `call_timeout`.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, call_timeout: Duration, telemetry: Telemetry) -> Self {
        Self {
            registry,
            call_timeout,
            telemetry,
        }
    }

    /// The registry this coordinator draws providers from.
    #[must_use]
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Attempts `call` on each candidate tier of `policy` in order, skipping
    /// tiers in `excluded`, tiers already failed for `modality`, and tiers that
    /// do not declare the modality. A failing or timed-out tier is marked
    /// failed for `modality` and added to `excluded`. Attempts are strictly
    /// sequential.
    pub async fn resolve<T, F, Fut>(
        &self,
        request_id: Uuid,
        modality: Modality,
        policy: &FallbackPolicy,
        excluded: &mut HashSet<Tier>,
        call: F,
    ) -> Resolution<T>
    where
        F: Fn(Arc<dyn Provider>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut walk = ModalityWalk::new(modality);
        let mut failures = Vec::new();
        let primary = policy.candidates().first().copied();

        for (index, &tier) in policy.candidates().iter().enumerate() {
            let scope = |kind| {
                Transition::new(kind)
                    .for_request(request_id)
                    .on_tier(tier)
                    .for_modality(modality)
            };

            if excluded.contains(&tier) {
                self.telemetry.emit(scope(TransitionKind::Skipped {
                    reason: "already attempted for this call".into(),
                }));
                continue;
            }
            if self.registry.is_failed(tier, modality) {
                self.telemetry.emit(scope(TransitionKind::Skipped {
                    reason: format!("{modality} marked failed"),
                }));
                continue;
            }

            let provider = match self.registry.get_or_init(tier).await {
                Ok(provider) => provider,
                Err(err) => {
                    let attempt = walk.try_tier(index, tier);
                    excluded.insert(tier);
                    self.telemetry.emit(
                        scope(TransitionKind::CallFailed {
                            reason: err.to_string(),
                        })
                        .at_attempt(attempt),
                    );
                    failures.push(err);
                    continue;
                }
            };
            if !provider.capabilities().supports(modality) {
                self.telemetry.emit(scope(TransitionKind::Skipped {
                    reason: format!("tier does not support {modality}"),
                }));
                continue;
            }

            let attempt = walk.try_tier(index, tier);
            self.telemetry
                .emit(scope(TransitionKind::Attempting).at_attempt(attempt));

            let result = tokio::time::timeout(self.call_timeout, call(provider))
                .await
                .unwrap_or(Err(ProviderError::Timeout(self.call_timeout)));

            match result {
                Ok(value) => {
                    walk.succeed();
                    self.registry.record_success(tier, modality);
                    self.telemetry
                        .emit(scope(TransitionKind::Succeeded).at_attempt(attempt));
                    return Resolution {
                        outcome: Some((tier, value)),
                        attempts: walk.attempts(),
                        failures,
                        primary,
                    };
                }
                Err(source) => {
                    self.registry.record_failure(tier, modality);
                    excluded.insert(tier);
                    let err = GenerationError::ProviderGeneration {
                        tier,
                        modality,
                        source,
                    };
                    self.telemetry.emit(
                        scope(TransitionKind::CallFailed {
                            reason: err.to_string(),
                        })
                        .at_attempt(attempt),
                    );
                    failures.push(err);
                }
            }
        }

        walk.exhaust();
        self.telemetry.emit(
            Transition::new(TransitionKind::Exhausted)
                .for_request(request_id)
                .for_modality(modality)
                .at_attempt(walk.attempts()),
        );
        Resolution {
            outcome: None,
            attempts: walk.attempts(),
            failures,
            primary,
        }
    }
}
