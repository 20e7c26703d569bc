//! Recording sink: captures transition events for assertions.

use std::sync::Mutex;

use taleforge_core::event::{TransitionEvent, TransitionKind, TransitionSink};
use taleforge_core::tier::{Modality, Tier};

/// A sink that keeps every recorded event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TransitionEvent>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Kinds recorded for one (tier, modality) pair, in order.
    pub fn kinds_for(&self, tier: Tier, modality: Modality) -> Vec<TransitionKind> {
        self.events()
            .into_iter()
            .filter(|e| e.transition.tier == Some(tier) && e.transition.modality == Some(modality))
            .map(|e| e.transition.kind)
            .collect()
    }

    /// Number of events whose kind satisfies `pred`.
    pub fn count(&self, pred: impl Fn(&TransitionKind) -> bool) -> usize {
        self.events()
            .iter()
            .filter(|e| pred(&e.transition.kind))
            .count()
    }
}

impl TransitionSink for RecordingSink {
    fn record(&self, event: TransitionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
