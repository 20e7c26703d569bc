//! Generation request and result types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GenerationError;
use crate::tier::{Modality, Satisfier};

/// Upper bound on frames a single request may ask for.
pub const MAX_SCENES: u32 = 12;

/// Upper bound on the requested story length, in words.
pub const MAX_TARGET_LENGTH: u32 = 5000;

fn default_theme() -> String {
    "adventure".to_owned()
}

fn default_target_length() -> u32 {
    400
}

fn default_num_scenes() -> u32 {
    4
}

fn default_language() -> String {
    "en".to_owned()
}

/// A single creative-content request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// What the story should be about.
    pub prompt: String,
    /// Stylistic theme, e.g. "bedtime" or "adventure".
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Desired story length in words.
    #[serde(default = "default_target_length")]
    pub target_length: u32,
    /// Number of illustrative frames to produce.
    #[serde(default = "default_num_scenes")]
    pub num_scenes: u32,
    /// Preferred narration voice, if any.
    #[serde(default)]
    pub voice: Option<String>,
    /// Language tag for text and narration.
    #[serde(default = "default_language")]
    pub language: String,
    /// Whether frames should carry an excerpt of the scene text.
    #[serde(default)]
    pub include_text_overlay: bool,
}

impl GenerationRequest {
    /// Creates a request with default settings for everything but the prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            theme: default_theme(),
            target_length: default_target_length(),
            num_scenes: default_num_scenes(),
            voice: None,
            language: default_language(),
            include_text_overlay: false,
        }
    }

    /// Checks the request before any provider is called.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Validation` describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::Validation("prompt must not be blank".into()));
        }
        if self.language.trim().is_empty() {
            return Err(GenerationError::Validation("language must not be blank".into()));
        }
        if !(1..=MAX_SCENES).contains(&self.num_scenes) {
            return Err(GenerationError::Validation(format!(
                "num_scenes must be between 1 and {MAX_SCENES}, got {}",
                self.num_scenes
            )));
        }
        if !(1..=MAX_TARGET_LENGTH).contains(&self.target_length) {
            return Err(GenerationError::Validation(format!(
                "target_length must be between 1 and {MAX_TARGET_LENGTH}, got {}",
                self.target_length
            )));
        }
        Ok(())
    }
}

/// One value per modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerModality<T> {
    /// Value for story text.
    pub text: T,
    /// Value for narration.
    pub narration: T,
    /// Value for frames.
    pub visual: T,
}

impl<T> PerModality<T> {
    /// Returns the value for `modality`.
    pub fn get(&self, modality: Modality) -> &T {
        match modality {
            Modality::Text => &self.text,
            Modality::Narration => &self.narration,
            Modality::Visual => &self.visual,
        }
    }
}

/// Provenance of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Identifier carried by every telemetry event of this request.
    pub request_id: Uuid,
    /// What produced each modality. `None` only for narration that no tier
    /// could produce.
    pub satisfied_tier: PerModality<Option<Satisfier>>,
    /// Whether each modality needed more than the first attempted tier.
    pub fallback_occurred: PerModality<bool>,
}

/// The assembled output of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// The generated story.
    pub story_text: String,
    /// Narration location; empty when narration degraded.
    pub audio_url: String,
    /// Frame locations; never empty.
    pub frames: Vec<String>,
    /// Provenance.
    pub metadata: GenerationMetadata,
}
