//! Scripted provider: a `Provider` whose every modality call follows a script.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use taleforge_core::error::ProviderError;
use taleforge_core::provider::Provider;
use taleforge_core::request::GenerationRequest;
use taleforge_core::tier::{Capabilities, Modality, Tier};

/// How a scripted modality call behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Return the canned output for the modality.
    Succeed,
    /// Return an empty output (blank text, empty audio url, no frames).
    Empty,
    /// Fail with the given error.
    Fail(ProviderError),
    /// Never complete. Only a timeout or cancellation ends the call.
    Hang,
}

/// A provider that follows per-modality scripts and counts calls.
///
/// Canned outputs name the tier so tests can tell which tier satisfied a
/// modality: text is `text_output`, narration is
/// `https://<tier>.example/narration.mp3`, frames are
/// `https://<tier>.example/frame-<i>.png`.
#[derive(Debug)]
pub struct ScriptedProvider {
    tier: Tier,
    capabilities: Capabilities,
    text_output: String,
    scripts: Mutex<[Script; 3]>,
    calls: [AtomicU32; 3],
}

fn slot(modality: Modality) -> usize {
    match modality {
        Modality::Text => 0,
        Modality::Narration => 1,
        Modality::Visual => 2,
    }
}

impl ScriptedProvider {
    /// A provider for `tier` that supports and succeeds at every modality.
    #[must_use]
    pub fn healthy(tier: Tier) -> Self {
        Self {
            tier,
            capabilities: Capabilities::ALL,
            text_output: format!("A story told by the {tier} tier."),
            scripts: Mutex::new([Script::Succeed, Script::Succeed, Script::Succeed]),
            calls: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    /// Sets the script for one modality.
    #[must_use]
    pub fn with(self, modality: Modality, script: Script) -> Self {
        self.set_script(modality, script);
        self
    }

    /// Sets the story text returned on success.
    #[must_use]
    pub fn with_text_output(mut self, text: impl Into<String>) -> Self {
        self.text_output = text.into();
        self
    }

    /// Removes a modality from the declared capabilities.
    #[must_use]
    pub fn without(mut self, modality: Modality) -> Self {
        self.capabilities = self.capabilities.without(modality);
        self
    }

    /// Replaces the script for one modality on a live provider.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_script(&self, modality: Modality, script: Script) {
        self.scripts.lock().unwrap()[slot(modality)] = script;
    }

    /// How many times `modality` was called.
    #[must_use]
    pub fn calls(&self, modality: Modality) -> u32 {
        self.calls[slot(modality)].load(Ordering::SeqCst)
    }

    fn script(&self, modality: Modality) -> Script {
        self.calls[slot(modality)].fetch_add(1, Ordering::SeqCst);
        self.scripts.lock().unwrap()[slot(modality)].clone()
    }

    async fn run<T>(&self, modality: Modality, success: T, empty: T) -> Result<T, ProviderError> {
        match self.script(modality) {
            Script::Succeed => Ok(success),
            Script::Empty => Ok(empty),
            Script::Fail(err) => Err(err),
            Script::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn generate_text(&self, _request: &GenerationRequest) -> Result<String, ProviderError> {
        self.run(Modality::Text, self.text_output.clone(), String::new())
            .await
    }

    async fn synthesize_narration(
        &self,
        _text: &str,
        _request: &GenerationRequest,
        _voice: Option<&str>,
    ) -> Result<String, ProviderError> {
        let url = format!("https://{}.example/narration.mp3", self.tier);
        self.run(Modality::Narration, url, String::new()).await
    }

    async fn create_frames(
        &self,
        _text: &str,
        _request: &GenerationRequest,
        count: u32,
    ) -> Result<Vec<String>, ProviderError> {
        let frames = (0..count)
            .map(|i| format!("https://{}.example/frame-{i}.png", self.tier))
            .collect();
        self.run(Modality::Visual, frames, Vec::new()).await
    }
}
