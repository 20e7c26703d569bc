//! Per-tier connection parameters read from the environment.

use std::path::PathBuf;

use taleforge_core::error::GenerationError;
use taleforge_core::tier::{Capabilities, Modality, Tier};

/// Connection parameters for one tier. Absent or blank variables are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSettings {
    pub tier: Tier,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model_path: Option<PathBuf>,
    pub capabilities: Capabilities,
}

impl TierSettings {
    /// Empty settings for `tier` with its default capability set.
    #[must_use]
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            endpoint: None,
            api_key: None,
            model_path: None,
            capabilities: default_capabilities(tier),
        }
    }

    /// Reads `TALEFORGE_<TIER>_*` through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Configuration` if the capability list names
    /// an unknown modality or is empty.
    pub fn from_lookup<F>(tier: Tier, lookup: &F) -> Result<Self, GenerationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |suffix: &str| {
            lookup(&variable(tier, suffix))
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let capabilities = match read("CAPABILITIES") {
            Some(list) => Capabilities::parse_list(&list)?,
            None => default_capabilities(tier),
        };
        Ok(Self {
            tier,
            endpoint: read("ENDPOINT").map(|e| e.trim_end_matches('/').to_owned()),
            api_key: read("API_KEY"),
            model_path: read("MODEL_PATH").map(PathBuf::from),
            capabilities,
        })
    }
}

/// Name of the variable holding `suffix` for `tier`, e.g.
/// `TALEFORGE_LOCAL_MODEL_PATH`.
#[must_use]
pub fn variable(tier: Tier, suffix: &str) -> String {
    format!("TALEFORGE_{}_{suffix}", tier.as_str().to_ascii_uppercase())
}

/// Edge gateways do not synthesize speech unless configured to.
fn default_capabilities(tier: Tier) -> Capabilities {
    match tier {
        Tier::Edge => Capabilities::ALL.without(Modality::Narration),
        Tier::Remote | Tier::Local => Capabilities::ALL,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_reads_tier_variables() {
        let env = lookup(&[
            ("TALEFORGE_REMOTE_ENDPOINT", "https://api.example.com/"),
            ("TALEFORGE_REMOTE_API_KEY", " sk-test "),
        ]);

        let settings = TierSettings::from_lookup(Tier::Remote, &env).unwrap();

        assert_eq!(settings.endpoint.as_deref(), Some("https://api.example.com"));
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.model_path, None);
        assert_eq!(settings.capabilities, Capabilities::ALL);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let env = lookup(&[("TALEFORGE_LOCAL_ENDPOINT", "   ")]);
        let settings = TierSettings::from_lookup(Tier::Local, &env).unwrap();
        assert_eq!(settings, TierSettings::new(Tier::Local));
    }

    #[test]
    fn test_edge_defaults_to_text_and_visual() {
        let settings = TierSettings::from_lookup(Tier::Edge, &lookup(&[])).unwrap();
        assert!(settings.capabilities.supports(Modality::Text));
        assert!(settings.capabilities.supports(Modality::Visual));
        assert!(!settings.capabilities.supports(Modality::Narration));
    }

    #[test]
    fn test_capabilities_override() {
        let env = lookup(&[("TALEFORGE_LOCAL_CAPABILITIES", "text")]);
        let settings = TierSettings::from_lookup(Tier::Local, &env).unwrap();
        assert!(!settings.capabilities.supports(Modality::Visual));
    }

    #[test]
    fn test_unknown_capability_is_configuration_error() {
        let env = lookup(&[("TALEFORGE_EDGE_CAPABILITIES", "text,smell")]);
        let err = TierSettings::from_lookup(Tier::Edge, &env).unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }
}
