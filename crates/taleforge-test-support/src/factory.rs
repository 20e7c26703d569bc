//! Test factories: mock `ProviderFactory` implementations that count
//! construction attempts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use taleforge_core::error::ProviderError;
use taleforge_core::provider::{Provider, ProviderFactory};

use crate::provider::ScriptedProvider;

/// A factory that hands out a shared `ScriptedProvider`, optionally after a
/// delay so tests can race concurrent first use.
#[derive(Debug)]
pub struct ScriptedFactory {
    provider: Arc<ScriptedProvider>,
    delay: Option<Duration>,
    constructions: AtomicU32,
}

impl ScriptedFactory {
    /// Creates a factory returning `provider` immediately.
    #[must_use]
    pub fn new(provider: Arc<ScriptedProvider>) -> Self {
        Self {
            provider,
            delay: None,
            constructions: AtomicU32::new(0),
        }
    }

    /// Makes every construction sleep for `delay` first.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `construct` was entered.
    #[must_use]
    pub fn constructions(&self) -> u32 {
        self.constructions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderFactory for ScriptedFactory {
    async fn construct(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.provider.clone())
    }
}

/// A factory whose construction always fails with the configured error.
#[derive(Debug)]
pub struct FailingFactory {
    error: ProviderError,
    constructions: AtomicU32,
}

impl FailingFactory {
    /// Creates a factory that fails with `error`.
    #[must_use]
    pub fn new(error: ProviderError) -> Self {
        Self {
            error,
            constructions: AtomicU32::new(0),
        }
    }

    /// A factory failing for missing credentials.
    #[must_use]
    pub fn missing_credentials() -> Self {
        Self::new(ProviderError::MissingCredentials("api key not configured".into()))
    }

    /// How many times `construct` was entered.
    #[must_use]
    pub fn constructions(&self) -> u32 {
        self.constructions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderFactory for FailingFactory {
    async fn construct(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}
