//! Terminal behavior once a modality's chain is exhausted.
//!
//! Text has no degraded form and fails the request. Narration degrades to an
//! empty audio url. Frames come from the placeholder renderer, which sits
//! outside every chain.

use taleforge_core::error::GenerationError;
use taleforge_core::request::GenerationRequest;
use taleforge_core::tier::{Modality, Satisfier};

use crate::domain::placeholder;

/// One modality's contribution to the assembled result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Produced<T> {
    pub value: T,
    /// `None` when the modality was left empty.
    pub satisfier: Option<Satisfier>,
    pub fallback_occurred: bool,
}

/// Story text after `attempts` failed tiers.
#[must_use]
pub fn text_exhausted(attempts: u32) -> GenerationError {
    GenerationError::ChainExhausted {
        modality: Modality::Text,
        attempts,
    }
}

/// Narration after `attempts` failed tiers: empty audio, no satisfier.
#[must_use]
pub fn narration_exhausted(attempts: u32) -> Produced<String> {
    Produced {
        value: String::new(),
        satisfier: None,
        fallback_occurred: attempts > 1,
    }
}

/// Frames after every tier failed, rendered locally for `story_text`.
#[must_use]
pub fn visual_exhausted(story_text: &str, request: &GenerationRequest) -> Produced<Vec<String>> {
    Produced {
        value: placeholder::render(story_text, request),
        satisfier: Some(Satisfier::Placeholder),
        fallback_occurred: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_exhaustion_is_an_error() {
        let err = text_exhausted(3);
        assert!(matches!(
            err,
            GenerationError::ChainExhausted {
                modality: Modality::Text,
                attempts: 3
            }
        ));
    }

    #[test]
    fn test_narration_degrades_to_empty_audio() {
        let single = narration_exhausted(1);
        assert_eq!(single.value, "");
        assert_eq!(single.satisfier, None);
        assert!(!single.fallback_occurred);
        assert!(narration_exhausted(3).fallback_occurred);
    }

    #[test]
    fn test_visual_degrades_to_placeholder_frames() {
        let mut request = GenerationRequest::new("a fox");
        request.num_scenes = 2;

        let frames = visual_exhausted("A fox. A lantern.", &request);

        assert_eq!(frames.value.len(), 2);
        assert_eq!(frames.satisfier, Some(Satisfier::Placeholder));
        assert!(frames.fallback_occurred);
    }
}
