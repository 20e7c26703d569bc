//! State machine for one modality's walk over the chain within one request.
//!
//! `NotStarted → TryingTier(i) → { Succeeded | TryingTier(j > i) | Exhausted }`.
//! `Succeeded` and `Exhausted` are terminal.

use taleforge_core::tier::{Modality, Tier};

/// Where a walk currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// No tier attempted yet.
    NotStarted,
    /// A call is in flight on the chain position `index`.
    TryingTier {
        /// Position in the policy chain.
        index: usize,
        /// Tier at that position.
        tier: Tier,
    },
    /// A tier produced the modality.
    Succeeded {
        /// The winning tier.
        tier: Tier,
    },
    /// No tier remains.
    Exhausted,
}

/// Tracks one modality's progress through the chain.
#[derive(Debug, Clone)]
pub struct ModalityWalk {
    modality: Modality,
    state: WalkState,
    attempts: u32,
}

impl ModalityWalk {
    /// A walk that has not attempted any tier.
    #[must_use]
    pub fn new(modality: Modality) -> Self {
        Self {
            modality,
            state: WalkState::NotStarted,
            attempts: 0,
        }
    }

    /// The modality being walked.
    #[must_use]
    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Tiers attempted so far, including one in flight.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the walk has reached `Succeeded` or `Exhausted`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, WalkState::Succeeded { .. } | WalkState::Exhausted)
    }

    /// Moves to `TryingTier(index)` and returns the 1-based attempt number.
    pub fn try_tier(&mut self, index: usize, tier: Tier) -> u32 {
        debug_assert!(
            match self.state {
                WalkState::NotStarted => true,
                WalkState::TryingTier { index: current, .. } => index > current,
                _ => false,
            },
            "invalid walk transition from {:?} to tier index {index}",
            self.state
        );
        self.state = WalkState::TryingTier { index, tier };
        self.attempts += 1;
        self.attempts
    }

    /// Marks the tier in flight as the winner.
    pub fn succeed(&mut self) {
        if let WalkState::TryingTier { tier, .. } = self.state {
            self.state = WalkState::Succeeded { tier };
        } else {
            debug_assert!(false, "succeed called from {:?}", self.state);
        }
    }

    /// Marks the walk exhausted.
    pub fn exhaust(&mut self) {
        debug_assert!(!self.is_terminal(), "exhaust called from {:?}", self.state);
        self.state = WalkState::Exhausted;
    }

    /// The winning tier, once succeeded.
    #[must_use]
    pub fn winner(&self) -> Option<Tier> {
        match self.state {
            WalkState::Succeeded { tier } => Some(tier),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_succeeds_on_second_tier() {
        let mut walk = ModalityWalk::new(Modality::Text);
        assert_eq!(walk.state(), WalkState::NotStarted);

        assert_eq!(walk.try_tier(0, Tier::Remote), 1);
        assert_eq!(walk.try_tier(1, Tier::Local), 2);
        walk.succeed();

        assert!(walk.is_terminal());
        assert_eq!(walk.winner(), Some(Tier::Local));
        assert_eq!(walk.attempts(), 2);
    }

    #[test]
    fn test_walk_exhausts_without_attempts() {
        let mut walk = ModalityWalk::new(Modality::Narration);
        walk.exhaust();

        assert_eq!(walk.state(), WalkState::Exhausted);
        assert_eq!(walk.attempts(), 0);
        assert_eq!(walk.winner(), None);
    }

    #[test]
    fn test_walk_can_skip_chain_positions() {
        let mut walk = ModalityWalk::new(Modality::Visual);
        walk.try_tier(0, Tier::Edge);
        walk.try_tier(2, Tier::Remote);

        assert_eq!(
            walk.state(),
            WalkState::TryingTier {
                index: 2,
                tier: Tier::Remote
            }
        );
        assert_eq!(walk.attempts(), 2);
    }
}
