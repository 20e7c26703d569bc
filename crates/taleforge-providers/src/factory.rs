//! Factories that validate tier settings and build [`HttpProvider`]s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taleforge_core::error::{GenerationError, ProviderError};
use taleforge_core::provider::{Provider, ProviderFactory, ProviderTable};
use taleforge_core::tier::Tier;
use tracing::info;

use crate::http::HttpProvider;
use crate::settings::{TierSettings, variable};

/// Checks the endpoint shared by every tier and builds the bare client.
fn connect(settings: &TierSettings, timeout: Duration) -> Result<HttpProvider, ProviderError> {
    let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
        ProviderError::Unavailable(format!(
            "{} is not set",
            variable(settings.tier, "ENDPOINT")
        ))
    })?;
    HttpProvider::new(settings.tier, settings.capabilities, endpoint, timeout)
}

fn constructed(provider: HttpProvider) -> Arc<dyn Provider> {
    info!(tier = %provider.tier(), endpoint = %provider.endpoint(), "http provider constructed");
    Arc::new(provider)
}

/// Hosted API tier: needs an endpoint and an API key.
#[derive(Debug, Clone)]
pub struct RemoteFactory {
    settings: TierSettings,
    timeout: Duration,
}

impl RemoteFactory {
    #[must_use]
    pub fn new(settings: TierSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }
}

#[async_trait]
impl ProviderFactory for RemoteFactory {
    async fn construct(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        let provider = connect(&self.settings, self.timeout)?;
        let key = self.settings.api_key.as_deref().ok_or_else(|| {
            ProviderError::MissingCredentials(format!(
                "{} is not set",
                variable(self.settings.tier, "API_KEY")
            ))
        })?;
        Ok(constructed(provider.with_api_key(key)))
    }
}

/// On-host model server: needs an endpoint and a model file that exists.
#[derive(Debug, Clone)]
pub struct LocalFactory {
    settings: TierSettings,
    timeout: Duration,
}

impl LocalFactory {
    #[must_use]
    pub fn new(settings: TierSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }
}

#[async_trait]
impl ProviderFactory for LocalFactory {
    async fn construct(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        let provider = connect(&self.settings, self.timeout)?;
        let path = self.settings.model_path.as_deref().ok_or_else(|| {
            ProviderError::MissingArtifact(format!(
                "{} is not set",
                variable(self.settings.tier, "MODEL_PATH")
            ))
        })?;
        if tokio::fs::metadata(path).await.is_err() {
            return Err(ProviderError::MissingArtifact(format!(
                "model file {} does not exist",
                path.display()
            )));
        }
        Ok(constructed(provider.with_model_path(path)))
    }
}

/// Lightweight edge tier: needs an endpoint; the API key is optional.
#[derive(Debug, Clone)]
pub struct EdgeFactory {
    settings: TierSettings,
    timeout: Duration,
}

impl EdgeFactory {
    #[must_use]
    pub fn new(settings: TierSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }
}

#[async_trait]
impl ProviderFactory for EdgeFactory {
    async fn construct(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        let mut provider = connect(&self.settings, self.timeout)?;
        if let Some(key) = self.settings.api_key.as_deref() {
            provider = provider.with_api_key(key);
        }
        Ok(constructed(provider))
    }
}

/// Builds a factory for every tier from `TALEFORGE_<TIER>_*` variables read
/// through `lookup`. Tiers are registered even when unconfigured so that
/// their absence surfaces as a construction failure at bootstrap.
///
/// # Errors
///
/// Returns `GenerationError::Configuration` for a malformed capability list.
pub fn provider_table_from_lookup<F>(
    lookup: &F,
    timeout: Duration,
) -> Result<ProviderTable, GenerationError>
where
    F: Fn(&str) -> Option<String>,
{
    let remote = TierSettings::from_lookup(Tier::Remote, lookup)?;
    let local = TierSettings::from_lookup(Tier::Local, lookup)?;
    let edge = TierSettings::from_lookup(Tier::Edge, lookup)?;
    Ok(ProviderTable::new()
        .with(Tier::Remote, Arc::new(RemoteFactory::new(remote, timeout)))
        .with(Tier::Local, Arc::new(LocalFactory::new(local, timeout)))
        .with(Tier::Edge, Arc::new(EdgeFactory::new(edge, timeout))))
}

/// [`provider_table_from_lookup`] over the process environment.
///
/// # Errors
///
/// See [`provider_table_from_lookup`].
pub fn provider_table_from_env(timeout: Duration) -> Result<ProviderTable, GenerationError> {
    provider_table_from_lookup(&|key: &str| std::env::var(key).ok(), timeout)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use taleforge_core::tier::Modality;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn settings(tier: Tier) -> TierSettings {
        TierSettings {
            endpoint: Some("http://127.0.0.1:9".into()),
            ..TierSettings::new(tier)
        }
    }

    #[tokio::test]
    async fn test_remote_without_api_key_is_missing_credentials() {
        let factory = RemoteFactory::new(settings(Tier::Remote), TIMEOUT);

        let err = factory.construct().await.unwrap_err();

        assert_eq!(
            err,
            ProviderError::MissingCredentials("TALEFORGE_REMOTE_API_KEY is not set".into())
        );
    }

    #[tokio::test]
    async fn test_remote_with_key_constructs() {
        let factory = RemoteFactory::new(
            TierSettings {
                api_key: Some("sk-test".into()),
                ..settings(Tier::Remote)
            },
            TIMEOUT,
        );

        let provider = factory.construct().await.unwrap();

        assert_eq!(provider.tier(), Tier::Remote);
    }

    #[tokio::test]
    async fn test_local_with_missing_model_is_missing_artifact() {
        let factory = LocalFactory::new(
            TierSettings {
                model_path: Some("/nonexistent/model.gguf".into()),
                ..settings(Tier::Local)
            },
            TIMEOUT,
        );

        let err = factory.construct().await.unwrap_err();

        assert!(matches!(err, ProviderError::MissingArtifact(_)));
    }

    #[tokio::test]
    async fn test_local_with_existing_model_constructs() {
        // Arrange
        let mut model = tempfile::NamedTempFile::new().unwrap();
        model.write_all(b"weights").unwrap();
        let factory = LocalFactory::new(
            TierSettings {
                model_path: Some(model.path().to_path_buf()),
                ..settings(Tier::Local)
            },
            TIMEOUT,
        );

        // Act
        let provider = factory.construct().await.unwrap();

        // Assert
        assert_eq!(provider.tier(), Tier::Local);
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_unavailable() {
        let factory = EdgeFactory::new(TierSettings::new(Tier::Edge), TIMEOUT);

        let err = factory.construct().await.unwrap_err();

        assert_eq!(
            err,
            ProviderError::Unavailable("TALEFORGE_EDGE_ENDPOINT is not set".into())
        );
    }

    #[tokio::test]
    async fn test_edge_keeps_configured_capabilities() {
        let factory = EdgeFactory::new(settings(Tier::Edge), TIMEOUT);

        let provider = factory.construct().await.unwrap();

        assert!(!provider.capabilities().supports(Modality::Narration));
        assert!(provider.capabilities().supports(Modality::Visual));
    }

    #[test]
    fn test_table_registers_every_tier() {
        let table = provider_table_from_lookup(&|_: &str| None, TIMEOUT).unwrap();
        assert_eq!(table.tiers(), vec![Tier::Remote, Tier::Local, Tier::Edge]);
    }

    #[tokio::test]
    async fn test_table_applies_each_tiers_own_requirements() {
        // Arrange: every tier has an endpoint and nothing else.
        let lookup = |key: &str| key.ends_with("_ENDPOINT").then(|| "http://127.0.0.1:9".to_owned());
        let table = provider_table_from_lookup(&lookup, TIMEOUT).unwrap();

        // Act
        let remote = table.get(Tier::Remote).unwrap().construct().await;
        let local = table.get(Tier::Local).unwrap().construct().await;
        let edge = table.get(Tier::Edge).unwrap().construct().await;

        // Assert
        assert!(matches!(remote, Err(ProviderError::MissingCredentials(_))));
        assert!(matches!(local, Err(ProviderError::MissingArtifact(_))));
        assert_eq!(edge.unwrap().tier(), Tier::Edge);
    }

    #[test]
    fn test_table_rejects_bad_capabilities() {
        let lookup = |key: &str| (key == "TALEFORGE_LOCAL_CAPABILITIES").then(|| "sound".to_owned());
        let err = provider_table_from_lookup(&lookup, TIMEOUT).unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }
}
