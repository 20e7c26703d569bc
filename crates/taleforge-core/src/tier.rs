//! Tiers, modalities and capability sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// A backend family able to provide generation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Hosted model API reached over the network.
    Remote,
    /// Model resident on the serving host.
    Local,
    /// On-device or edge gateway model.
    Edge,
}

impl Tier {
    /// Every tier, in declaration order.
    pub const ALL: [Tier; 3] = [Tier::Remote, Tier::Local, Tier::Edge];

    /// Lowercase identifier used in configuration and telemetry.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Remote => "remote",
            Tier::Local => "local",
            Tier::Edge => "edge",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Tier::Remote),
            "local" => Ok(Tier::Local),
            "edge" => Ok(Tier::Edge),
            other => Err(GenerationError::Configuration(format!(
                "unknown tier '{other}'"
            ))),
        }
    }
}

/// An independently-failable part of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Story text.
    Text,
    /// Narrated audio.
    Narration,
    /// Illustrative frames.
    Visual,
}

impl Modality {
    /// Every modality, in the order a request produces them.
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Narration, Modality::Visual];

    /// Lowercase identifier used in configuration and telemetry.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Narration => "narration",
            Modality::Visual => "visual",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "narration" => Ok(Modality::Narration),
            "visual" => Ok(Modality::Visual),
            other => Err(GenerationError::Configuration(format!(
                "unknown modality '{other}'"
            ))),
        }
    }
}

/// The set of modalities a provider declares support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Supports `generate_text`.
    pub text: bool,
    /// Supports `synthesize_narration`.
    pub narration: bool,
    /// Supports `create_frames`.
    pub visual: bool,
}

impl Capabilities {
    /// All three modalities.
    pub const ALL: Capabilities = Capabilities {
        text: true,
        narration: true,
        visual: true,
    };

    /// Returns whether `modality` is part of this set.
    #[must_use]
    pub fn supports(self, modality: Modality) -> bool {
        match modality {
            Modality::Text => self.text,
            Modality::Narration => self.narration,
            Modality::Visual => self.visual,
        }
    }

    /// Returns a copy of this set with `modality` removed.
    #[must_use]
    pub fn without(mut self, modality: Modality) -> Self {
        match modality {
            Modality::Text => self.text = false,
            Modality::Narration => self.narration = false,
            Modality::Visual => self.visual = false,
        }
        self
    }

    /// Parses a comma-separated modality list such as `"text,visual"`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Configuration` for an unknown modality or an
    /// empty list.
    pub fn parse_list(list: &str) -> Result<Self, GenerationError> {
        let mut caps = Capabilities {
            text: false,
            narration: false,
            visual: false,
        };
        for item in list.split(',').filter(|s| !s.trim().is_empty()) {
            match item.parse::<Modality>()? {
                Modality::Text => caps.text = true,
                Modality::Narration => caps.narration = true,
                Modality::Visual => caps.visual = true,
            }
        }
        if caps == (Capabilities { text: false, narration: false, visual: false }) {
            return Err(GenerationError::Configuration(
                "capability list must name at least one modality".into(),
            ));
        }
        Ok(caps)
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// What ultimately produced a modality's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Satisfier {
    /// The remote tier.
    Remote,
    /// The local tier.
    Local,
    /// The edge tier.
    Edge,
    /// The chain-external placeholder renderer.
    Placeholder,
}

impl From<Tier> for Satisfier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Remote => Satisfier::Remote,
            Tier::Local => Satisfier::Local,
            Tier::Edge => Satisfier::Edge,
        }
    }
}

impl fmt::Display for Satisfier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Satisfier::Remote => f.write_str("remote"),
            Satisfier::Local => f.write_str("local"),
            Satisfier::Edge => f.write_str("edge"),
            Satisfier::Placeholder => f.write_str("placeholder"),
        }
    }
}
