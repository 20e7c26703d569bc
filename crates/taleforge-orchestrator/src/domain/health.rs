//! Per-tier, per-modality health.

use serde::Serialize;
use taleforge_core::request::PerModality;
use taleforge_core::tier::Modality;

/// Health of one (tier, modality) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Never called, or reset since.
    #[default]
    Untried,
    /// The last call succeeded.
    Healthy,
    /// A call or the construction failed. Terminal until reset.
    Failed,
}

/// Health of every modality on one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct TierHealth(PerModality<HealthState>);

impl TierHealth {
    /// Current state for `modality`.
    #[must_use]
    pub fn get(&self, modality: Modality) -> HealthState {
        *self.0.get(modality)
    }

    /// Moves `modality` to `next`. A `Failed` modality stays failed; returns
    /// whether the state changed.
    pub fn transition(&mut self, modality: Modality, next: HealthState) -> bool {
        let current = match modality {
            Modality::Text => &mut self.0.text,
            Modality::Narration => &mut self.0.narration,
            Modality::Visual => &mut self.0.visual,
        };
        if *current == HealthState::Failed || *current == next {
            return false;
        }
        *current = next;
        true
    }

    /// Marks every modality failed.
    pub fn fail_all(&mut self) {
        for modality in Modality::ALL {
            self.transition(modality, HealthState::Failed);
        }
    }
}
