//! Process-level facade tying settings, registry, policy and coordinator
//! together.

use std::sync::{Arc, PoisonError, RwLock};

use taleforge_core::config::OrchestratorSettings;
use taleforge_core::error::GenerationError;
use taleforge_core::event::Telemetry;
use taleforge_core::policy::{FallbackPolicy, resolve_mode};
use taleforge_core::provider::ProviderTable;
use taleforge_core::request::{GenerationRequest, GenerationResult};
use taleforge_core::tier::Tier;
use tracing::{info, warn};

use crate::application::bootstrap::bootstrap;
use crate::application::coordinator::GenerationCoordinator;
use crate::application::fallback::RuntimeFallbackCoordinator;
use crate::application::registry::ProviderRegistry;

/// The policy currently serving requests and the tier bootstrap chose for it.
#[derive(Debug, Clone)]
pub struct ActivePolicy {
    /// Immutable policy shared by bootstrap and runtime paths.
    pub policy: Arc<FallbackPolicy>,
    /// Happy-path default tier.
    pub default_tier: Tier,
}

/// A bootstrapped orchestrator, ready to serve generation requests.
#[derive(Debug)]
pub struct Orchestrator {
    settings: OrchestratorSettings,
    registry: Arc<ProviderRegistry>,
    coordinator: GenerationCoordinator,
    active: RwLock<ActivePolicy>,
}

impl Orchestrator {
    /// Resolves the configured mode and bootstraps the provider chain.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Configuration` for an unrecognized mode and
    /// `GenerationError::ChainExhausted` when no tier can be initialized.
    /// Either is fatal: the process should not serve requests.
    pub async fn start(
        settings: OrchestratorSettings,
        table: ProviderTable,
        telemetry: Telemetry,
    ) -> Result<Self, GenerationError> {
        let policy = resolve_mode(&settings.mode)?;
        let registry = Arc::new(ProviderRegistry::new(
            table,
            settings.construct_timeout,
            telemetry.clone(),
        ));
        let report = bootstrap(&registry, &policy).await?;
        let fallback =
            RuntimeFallbackCoordinator::new(registry.clone(), settings.call_timeout, telemetry.clone());

        Ok(Self {
            coordinator: GenerationCoordinator::new(fallback, telemetry),
            registry,
            active: RwLock::new(ActivePolicy {
                policy: Arc::new(policy),
                default_tier: report.tier,
            }),
            settings,
        })
    }

    /// Serves one request under the configured caller-level deadline.
    ///
    /// # Errors
    ///
    /// See [`GenerationCoordinator::handle_with_deadline`].
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let active = self.active();
        self.coordinator
            .handle_with_deadline(request, &active.policy, self.settings.request_timeout)
            .await
    }

    /// Switches to the policy named by `mode`, resets every tier and
    /// bootstraps again. Returns the new default tier.
    ///
    /// Requests already in flight finish under the policy they started with.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Configuration` for an unrecognized mode, in
    /// which case nothing changes, and `GenerationError::ChainExhausted` if
    /// no tier of the new policy initializes, in which case the previous
    /// policy stays active over the reset registry.
    pub async fn reload(&self, mode: &str) -> Result<Tier, GenerationError> {
        let policy = resolve_mode(mode).inspect_err(|err| {
            warn!(error = %err, "reload rejected, keeping active policy");
        })?;
        self.registry.reset().await;
        let report = bootstrap(&self.registry, &policy).await?;

        let active = ActivePolicy {
            policy: Arc::new(policy),
            default_tier: report.tier,
        };
        info!(mode = %active.policy.mode(), tier = %active.default_tier, "policy reloaded");
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = active;
        Ok(report.tier)
    }

    /// The policy and default tier currently serving requests.
    #[must_use]
    pub fn active(&self) -> ActivePolicy {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }
}
