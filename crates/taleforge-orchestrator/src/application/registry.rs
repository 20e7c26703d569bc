//! Provider registry: lazy, memoized, race-safe construction per tier.
//!
//! Each tier owns an async mutex around its instance slot. The lock is held
//! only while a construction is in flight, so concurrent first use of an
//! untried tier results in one construction while the other callers wait for
//! its outcome. Generation calls run on a cloned `Arc` and take no lock.
//! Operator snapshots read a separate view of each slot and never touch the
//! slot lock.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use taleforge_core::error::{GenerationError, ProviderError};
use taleforge_core::event::{Telemetry, Transition, TransitionKind};
use taleforge_core::provider::{Provider, ProviderTable};
use taleforge_core::tier::{Capabilities, Modality, Tier};
use tokio::sync::Mutex;

use crate::domain::health::{HealthState, TierHealth};

enum Slot {
    Untried,
    Ready(Arc<dyn Provider>),
    Failed(ProviderError),
}

impl Slot {
    fn view(&self) -> SlotView {
        match self {
            Self::Untried => SlotView::default(),
            Self::Ready(provider) => SlotView {
                instance: InstanceState::Ready,
                capabilities: Some(provider.capabilities()),
                failure: None,
            },
            Self::Failed(source) => SlotView {
                instance: InstanceState::Failed,
                capabilities: None,
                failure: Some(source.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct SlotView {
    instance: InstanceState,
    capabilities: Option<Capabilities>,
    failure: Option<String>,
}

impl Default for SlotView {
    fn default() -> Self {
        Self {
            instance: InstanceState::Untried,
            capabilities: None,
            failure: None,
        }
    }
}

/// Clears the in-flight flag when a construction ends or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct TierEntry {
    slot: Mutex<Slot>,
    view: RwLock<SlotView>,
    constructing: AtomicBool,
    health: RwLock<TierHealth>,
    constructions: AtomicU32,
}

impl TierEntry {
    fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Untried),
            view: RwLock::new(SlotView::default()),
            constructing: AtomicBool::new(false),
            health: RwLock::new(TierHealth::default()),
            constructions: AtomicU32::new(0),
        }
    }

    /// Stores `next` in the slot; the caller holds the slot lock.
    fn publish(&self, slot: &mut Slot, next: Slot) {
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = next.view();
        *slot = next;
    }

    fn view(&self) -> SlotView {
        if self.constructing.load(Ordering::SeqCst) {
            return SlotView {
                instance: InstanceState::Constructing,
                ..SlotView::default()
            };
        }
        self.view.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn health(&self) -> TierHealth {
        *self.health.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_health(&self, f: impl FnOnce(&mut TierHealth)) {
        let mut health = self.health.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *health);
    }
}

/// Construction state of a tier as seen by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    /// Not constructed yet.
    Untried,
    /// A construction is in flight.
    Constructing,
    /// Constructed and memoized.
    Ready,
    /// Construction failed; not retried until reset.
    Failed,
}

/// Point-in-time status of one tier.
#[derive(Debug, Clone, Serialize)]
pub struct TierStatus {
    /// The tier described.
    pub tier: Tier,
    /// Construction state.
    pub instance: InstanceState,
    /// Declared capabilities, once constructed.
    pub capabilities: Option<Capabilities>,
    /// Per-modality health.
    pub health: TierHealth,
    /// Construction attempts over the process lifetime.
    pub construction_attempts: u32,
    /// Construction failure, if any.
    pub failure: Option<String>,
}

/// Process-wide registry of tier providers and their health.
pub struct ProviderRegistry {
    table: ProviderTable,
    entries: [TierEntry; 3],
    construct_timeout: Duration,
    telemetry: Telemetry,
}

impl ProviderRegistry {
    /// Creates a registry over `table` with every tier untried.
    #[must_use]
    pub fn new(table: ProviderTable, construct_timeout: Duration, telemetry: Telemetry) -> Self {
        Self {
            table,
            entries: [TierEntry::new(), TierEntry::new(), TierEntry::new()],
            construct_timeout,
            telemetry,
        }
    }

    fn entry(&self, tier: Tier) -> &TierEntry {
        match tier {
            Tier::Remote => &self.entries[0],
            Tier::Local => &self.entries[1],
            Tier::Edge => &self.entries[2],
        }
    }

    /// Returns the memoized provider for `tier`, constructing it on first use.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::ProviderInitialization` if construction
    /// fails now or failed earlier in this process lifetime.
    pub async fn get_or_init(&self, tier: Tier) -> Result<Arc<dyn Provider>, GenerationError> {
        let entry = self.entry(tier);
        let mut slot = entry.slot.lock().await;
        match &*slot {
            Slot::Ready(provider) => return Ok(provider.clone()),
            Slot::Failed(source) => {
                return Err(GenerationError::ProviderInitialization {
                    tier,
                    source: source.clone(),
                });
            }
            Slot::Untried => {}
        }

        entry.constructions.fetch_add(1, Ordering::SeqCst);
        let in_flight = InFlight::start(&entry.constructing);
        let outcome = match self.table.get(tier) {
            None => Err(ProviderError::Unsupported(format!(
                "no provider factory registered for tier {tier}"
            ))),
            Some(factory) => tokio::time::timeout(self.construct_timeout, factory.construct())
                .await
                .unwrap_or(Err(ProviderError::Timeout(self.construct_timeout))),
        };

        let result = match outcome {
            Ok(provider) => {
                entry.publish(&mut slot, Slot::Ready(provider.clone()));
                self.telemetry
                    .emit(Transition::new(TransitionKind::Constructed).on_tier(tier));
                Ok(provider)
            }
            Err(source) => {
                entry.publish(&mut slot, Slot::Failed(source.clone()));
                entry.update_health(TierHealth::fail_all);
                self.telemetry.emit(
                    Transition::new(TransitionKind::ConstructionFailed {
                        reason: source.to_string(),
                    })
                    .on_tier(tier),
                );
                Err(GenerationError::ProviderInitialization { tier, source })
            }
        };
        drop(in_flight);
        result
    }

    /// Current health of (`tier`, `modality`).
    #[must_use]
    pub fn health(&self, tier: Tier, modality: Modality) -> HealthState {
        self.entry(tier).health().get(modality)
    }

    /// Whether (`tier`, `modality`) is marked failed.
    #[must_use]
    pub fn is_failed(&self, tier: Tier, modality: Modality) -> bool {
        self.health(tier, modality) == HealthState::Failed
    }

    /// Records a successful call.
    pub fn record_success(&self, tier: Tier, modality: Modality) {
        self.entry(tier).update_health(|h| {
            h.transition(modality, HealthState::Healthy);
        });
    }

    /// Records a failed call; the pair is not retried until reset.
    pub fn record_failure(&self, tier: Tier, modality: Modality) {
        self.entry(tier).update_health(|h| {
            h.transition(modality, HealthState::Failed);
        });
    }

    /// Construction attempts made for `tier` over the process lifetime.
    #[must_use]
    pub fn construction_attempts(&self, tier: Tier) -> u32 {
        self.entry(tier).constructions.load(Ordering::SeqCst)
    }

    /// Drops every instance and returns every tier and modality to
    /// `Untried`. Waits for constructions in flight to finish first.
    pub async fn reset(&self) {
        for entry in &self.entries {
            let mut slot = entry.slot.lock().await;
            entry.publish(&mut slot, Slot::Untried);
            entry.update_health(|h| *h = TierHealth::default());
        }
        self.telemetry.emit(Transition::new(TransitionKind::Reset));
    }

    /// Status of every tier, without waiting on constructions in flight.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TierStatus> {
        Tier::ALL
            .into_iter()
            .map(|tier| {
                let entry = self.entry(tier);
                let view = entry.view();
                TierStatus {
                    tier,
                    instance: view.instance,
                    capabilities: view.capabilities,
                    health: entry.health(),
                    construction_attempts: entry.constructions.load(Ordering::SeqCst),
                    failure: view.failure,
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("table", &self.table)
            .field("construct_timeout", &self.construct_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use taleforge_core::event::Clock;
    use taleforge_test_support::{
        FailingFactory, FixedClock, RecordingSink, ScriptedFactory, ScriptedProvider,
    };

    use super::*;

    fn telemetry(sink: &Arc<RecordingSink>) -> Telemetry {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
        Telemetry::new(clock, sink.clone())
    }

    fn registry_with(table: ProviderTable, sink: &Arc<RecordingSink>) -> ProviderRegistry {
        ProviderRegistry::new(table, Duration::from_secs(30), telemetry(sink))
    }

    #[tokio::test]
    async fn test_get_or_init_memoizes_instance() {
        // Arrange
        let sink = Arc::new(RecordingSink::new());
        let factory = Arc::new(ScriptedFactory::new(Arc::new(ScriptedProvider::healthy(
            Tier::Local,
        ))));
        let registry = registry_with(ProviderTable::new().with(Tier::Local, factory.clone()), &sink);

        // Act
        let first = registry.get_or_init(Tier::Local).await.unwrap();
        let second = registry.get_or_init(Tier::Local).await.unwrap();

        // Assert
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.constructions(), 1);
        assert_eq!(registry.construction_attempts(Tier::Local), 1);
        assert_eq!(sink.count(|k| *k == TransitionKind::Constructed), 1);
    }

    #[tokio::test]
    async fn test_failed_construction_is_never_retried() {
        // Arrange
        let sink = Arc::new(RecordingSink::new());
        let factory = Arc::new(FailingFactory::missing_credentials());
        let registry = registry_with(ProviderTable::new().with(Tier::Remote, factory.clone()), &sink);

        // Act
        let first = registry.get_or_init(Tier::Remote).await;
        let second = registry.get_or_init(Tier::Remote).await;

        // Assert
        assert!(matches!(
            first,
            Err(GenerationError::ProviderInitialization {
                tier: Tier::Remote,
                source: ProviderError::MissingCredentials(_)
            })
        ));
        assert!(second.is_err());
        assert_eq!(factory.constructions(), 1);
        for modality in Modality::ALL {
            assert!(registry.is_failed(Tier::Remote, modality));
        }
        assert_eq!(
            sink.count(|k| matches!(k, TransitionKind::ConstructionFailed { .. })),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_factory_is_initialization_error() {
        let sink = Arc::new(RecordingSink::new());
        let registry = registry_with(ProviderTable::new(), &sink);

        let err = registry.get_or_init(Tier::Edge).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ProviderInitialization {
                tier: Tier::Edge,
                source: ProviderError::Unsupported(_)
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_first_use_constructs_once() {
        // Arrange
        let sink = Arc::new(RecordingSink::new());
        let factory = Arc::new(
            ScriptedFactory::new(Arc::new(ScriptedProvider::healthy(Tier::Edge)))
                .with_delay(Duration::from_millis(50)),
        );
        let registry = Arc::new(registry_with(
            ProviderTable::new().with(Tier::Edge, factory.clone()),
            &sink,
        ));

        // Act
        let (a, b) = tokio::join!(registry.get_or_init(Tier::Edge), registry.get_or_init(Tier::Edge));

        // Assert
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(factory.constructions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_construction_timeout_marks_tier_failed() {
        // Arrange
        let sink = Arc::new(RecordingSink::new());
        let factory = Arc::new(
            ScriptedFactory::new(Arc::new(ScriptedProvider::healthy(Tier::Local)))
                .with_delay(Duration::from_secs(60)),
        );
        let registry = ProviderRegistry::new(
            ProviderTable::new().with(Tier::Local, factory),
            Duration::from_secs(5),
            telemetry(&sink),
        );

        // Act
        let err = registry.get_or_init(Tier::Local).await.unwrap_err();

        // Assert
        assert!(matches!(
            err,
            GenerationError::ProviderInitialization {
                source: ProviderError::Timeout(_),
                ..
            }
        ));
        assert_eq!(registry.snapshot()[1].instance, InstanceState::Failed);
    }

    #[tokio::test]
    async fn test_reset_allows_reconstruction() {
        // Arrange
        let sink = Arc::new(RecordingSink::new());
        let factory = Arc::new(ScriptedFactory::new(Arc::new(ScriptedProvider::healthy(
            Tier::Remote,
        ))));
        let registry = registry_with(ProviderTable::new().with(Tier::Remote, factory.clone()), &sink);
        registry.get_or_init(Tier::Remote).await.unwrap();
        registry.record_failure(Tier::Remote, Modality::Text);

        // Act
        registry.reset().await;

        // Assert
        assert_eq!(registry.health(Tier::Remote, Modality::Text), HealthState::Untried);
        assert_eq!(registry.snapshot()[0].instance, InstanceState::Untried);
        registry.get_or_init(Tier::Remote).await.unwrap();
        assert_eq!(factory.constructions(), 2);
        assert_eq!(sink.count(|k| *k == TransitionKind::Reset), 1);
    }

    #[tokio::test]
    async fn test_record_failure_is_terminal_for_modality_only() {
        let sink = Arc::new(RecordingSink::new());
        let registry = registry_with(ProviderTable::new(), &sink);

        registry.record_success(Tier::Local, Modality::Narration);
        registry.record_failure(Tier::Local, Modality::Narration);
        registry.record_success(Tier::Local, Modality::Narration);

        assert!(registry.is_failed(Tier::Local, Modality::Narration));
        assert_eq!(registry.health(Tier::Local, Modality::Text), HealthState::Untried);
    }

    #[tokio::test]
    async fn test_snapshot_reports_capabilities_of_ready_tiers() {
        let sink = Arc::new(RecordingSink::new());
        let provider = ScriptedProvider::healthy(Tier::Edge).without(Modality::Narration);
        let factory = Arc::new(ScriptedFactory::new(Arc::new(provider)));
        let registry = registry_with(ProviderTable::new().with(Tier::Edge, factory), &sink);
        registry.get_or_init(Tier::Edge).await.unwrap();

        let snapshot = registry.snapshot();

        assert_eq!(snapshot.len(), 3);
        let edge = &snapshot[2];
        assert_eq!(edge.tier, Tier::Edge);
        assert_eq!(edge.instance, InstanceState::Ready);
        let caps = edge.capabilities.unwrap();
        assert!(!caps.supports(Modality::Narration));
        assert_eq!(edge.construction_attempts, 1);
    }

    #[tokio::test]
    async fn test_snapshot_reports_ready_while_slot_lock_is_held() {
        // Arrange
        let sink = Arc::new(RecordingSink::new());
        let factory = Arc::new(ScriptedFactory::new(Arc::new(ScriptedProvider::healthy(
            Tier::Remote,
        ))));
        let registry = registry_with(ProviderTable::new().with(Tier::Remote, factory), &sink);
        registry.get_or_init(Tier::Remote).await.unwrap();

        // Act: a concurrent lookup holds the slot lock while the snapshot runs.
        let guard = registry.entry(Tier::Remote).slot.lock().await;
        let snapshot = registry.snapshot();
        drop(guard);

        // Assert
        assert_eq!(snapshot[0].instance, InstanceState::Ready);
        assert!(snapshot[0].capabilities.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_construction_in_flight() {
        // Arrange
        let sink = Arc::new(RecordingSink::new());
        let factory = Arc::new(
            ScriptedFactory::new(Arc::new(ScriptedProvider::healthy(Tier::Local)))
                .with_delay(Duration::from_secs(1)),
        );
        let registry = Arc::new(registry_with(
            ProviderTable::new().with(Tier::Local, factory),
            &sink,
        ));

        // Act
        let pending = tokio::spawn({
            let registry = registry.clone();
            async move { registry.get_or_init(Tier::Local).await.map(|_| ()) }
        });
        tokio::task::yield_now().await;
        let during = registry.snapshot()[1].instance;
        pending.await.unwrap().unwrap();
        let after = registry.snapshot()[1].instance;

        // Assert
        assert_eq!(during, InstanceState::Constructing);
        assert_eq!(after, InstanceState::Ready);
    }
}
