//! Tier transition telemetry.
//!
//! Every construction, attempt, failure, skip and degradation produces a
//! `TransitionEvent`. Events are handed to a `TransitionSink`; the default
//! sink writes them through `tracing` for operational dashboards.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::tier::{Modality, Satisfier, Tier};

/// Abstraction over system time so event timestamps are deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What happened to a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionKind {
    /// The tier's provider was constructed.
    Constructed,
    /// The tier's provider could not be constructed.
    ConstructionFailed {
        /// Why construction failed.
        reason: String,
    },
    /// A modality call is about to be made on the tier.
    Attempting,
    /// The modality call succeeded.
    Succeeded,
    /// The modality call failed or timed out.
    CallFailed {
        /// Why the call failed.
        reason: String,
    },
    /// The tier was passed over without a call.
    Skipped {
        /// Why the tier was passed over.
        reason: String,
    },
    /// No tier remains for the modality.
    Exhausted,
    /// The modality was completed in reduced form.
    Degraded {
        /// What stood in, if anything.
        to: Option<Satisfier>,
    },
    /// All tiers were returned to the untried state.
    Reset,
}

/// A transition before it is stamped with a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Request the transition belongs to, if any.
    pub request_id: Option<Uuid>,
    /// Tier affected, if any.
    pub tier: Option<Tier>,
    /// Modality affected, if any.
    pub modality: Option<Modality>,
    /// 1-based attempt number within the modality walk; 0 outside a walk.
    pub attempt: u32,
    /// What happened.
    #[serde(flatten)]
    pub kind: TransitionKind,
}

impl Transition {
    /// Starts a transition of the given kind with no scope attached.
    #[must_use]
    pub fn new(kind: TransitionKind) -> Self {
        Self {
            request_id: None,
            tier: None,
            modality: None,
            attempt: 0,
            kind,
        }
    }

    /// Attaches the request identifier.
    #[must_use]
    pub fn for_request(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Attaches the tier.
    #[must_use]
    pub fn on_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Attaches the modality.
    #[must_use]
    pub fn for_modality(mut self, modality: Modality) -> Self {
        self.modality = Some(modality);
        self
    }

    /// Attaches the attempt number.
    #[must_use]
    pub fn at_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }
}

/// A transition stamped with the time it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEvent {
    /// When the transition was observed.
    pub occurred_at: DateTime<Utc>,
    /// The transition itself.
    #[serde(flatten)]
    pub transition: Transition,
}

/// Destination for transition events.
pub trait TransitionSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: TransitionEvent);
}

/// Sink that writes every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TransitionSink for TracingSink {
    fn record(&self, event: TransitionEvent) {
        let t = &event.transition;
        let tier = t.tier.map_or("-", Tier::as_str);
        let modality = t.modality.map_or("-", Modality::as_str);
        let request_id = t.request_id.map(|id| id.to_string()).unwrap_or_default();
        match &t.kind {
            TransitionKind::ConstructionFailed { reason } => {
                warn!(tier, reason = %reason, "tier construction failed");
            }
            TransitionKind::CallFailed { reason } => {
                warn!(%request_id, tier, modality, attempt = t.attempt, reason = %reason, "provider call failed");
            }
            TransitionKind::Exhausted => {
                warn!(%request_id, modality, attempts = t.attempt, "fallback chain exhausted");
            }
            TransitionKind::Constructed => info!(tier, "tier constructed"),
            TransitionKind::Succeeded => {
                info!(%request_id, tier, modality, attempt = t.attempt, "provider call succeeded");
            }
            TransitionKind::Degraded { to } => {
                let to = to.map(|s| s.to_string()).unwrap_or_default();
                info!(%request_id, modality, to = %to, "modality degraded");
            }
            TransitionKind::Reset => info!("provider registry reset"),
            TransitionKind::Attempting => {
                debug!(%request_id, tier, modality, attempt = t.attempt, "attempting tier");
            }
            TransitionKind::Skipped { reason } => {
                debug!(%request_id, tier, modality, reason = %reason, "tier skipped");
            }
        }
    }
}

/// Clock and sink bundled for the components that emit transitions.
#[derive(Clone)]
pub struct Telemetry {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TransitionSink>,
}

impl Telemetry {
    /// Creates telemetry from an explicit clock and sink.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn TransitionSink>) -> Self {
        Self { clock, sink }
    }

    /// System clock and `TracingSink`.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TracingSink))
    }

    /// Stamps `transition` and hands it to the sink.
    pub fn emit(&self, transition: Transition) {
        self.sink.record(TransitionEvent {
            occurred_at: self.clock.now(),
            transition,
        });
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry").finish_non_exhaustive()
    }
}
