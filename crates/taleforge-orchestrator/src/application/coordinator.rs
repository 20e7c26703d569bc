//! Request-level coordination: text first, then narration and frames
//! concurrently, with degradation for the optional modalities.

use std::collections::HashSet;
use std::time::Duration;

use taleforge_core::error::{GenerationError, ProviderError};
use taleforge_core::event::{Telemetry, Transition, TransitionKind};
use taleforge_core::policy::FallbackPolicy;
use taleforge_core::request::{GenerationMetadata, GenerationRequest, GenerationResult, PerModality};
use taleforge_core::tier::{Modality, Satisfier};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::fallback::RuntimeFallbackCoordinator;
use crate::domain::modality_policy::{
    Produced, narration_exhausted, text_exhausted, visual_exhausted,
};

/// Drives a single request through the fallback coordinator.
#[derive(Debug, Clone)]
pub struct GenerationCoordinator {
    fallback: RuntimeFallbackCoordinator,
    telemetry: Telemetry,
}

impl GenerationCoordinator {
    #[must_use]
    pub fn new(fallback: RuntimeFallbackCoordinator, telemetry: Telemetry) -> Self {
        Self {
            fallback,
            telemetry,
        }
    }

    /// Like [`handle`](Self::handle), bounded by a caller-level `deadline`.
    /// Expiry drops every in-flight provider call.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::DeadlineExceeded` when the deadline expires,
    /// otherwise whatever `handle` returns.
    pub async fn handle_with_deadline(
        &self,
        request: &GenerationRequest,
        policy: &FallbackPolicy,
        deadline: Duration,
    ) -> Result<GenerationResult, GenerationError> {
        tokio::time::timeout(deadline, self.handle(request, policy))
            .await
            .unwrap_or(Err(GenerationError::DeadlineExceeded(deadline)))
    }

    /// Produces story text, narration and frames for `request`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Validation` for a malformed request and
    /// `GenerationError::ChainExhausted` when no tier produces story text.
    /// Narration and frame failures never fail the request.
    #[instrument(skip_all, fields(mode = %policy.mode(), request_id = tracing::field::Empty))]
    pub async fn handle(
        &self,
        request: &GenerationRequest,
        policy: &FallbackPolicy,
    ) -> Result<GenerationResult, GenerationError> {
        request.validate()?;
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let text = self
            .fallback
            .resolve(
                request_id,
                Modality::Text,
                policy,
                &mut HashSet::new(),
                |provider| async move {
                    let text = provider.generate_text(request).await?;
                    if text.trim().is_empty() {
                        return Err(ProviderError::Other("provider returned blank story text".into()));
                    }
                    Ok(text)
                },
            )
            .await;
        let text_fallback = text.fallback_occurred();
        let Some((text_tier, story_text)) = text.outcome else {
            warn!(attempts = text.attempts, "story text unavailable on every tier");
            return Err(text_exhausted(text.attempts));
        };

        let (narration, frames) = tokio::join!(
            self.narrate(request_id, request, policy, &story_text),
            self.illustrate(request_id, request, policy, &story_text),
        );

        info!(
            text = %text_tier,
            narration = ?narration.satisfier,
            visual = ?frames.satisfier,
            "request assembled"
        );

        Ok(GenerationResult {
            metadata: GenerationMetadata {
                request_id,
                satisfied_tier: PerModality {
                    text: Some(text_tier.into()),
                    narration: narration.satisfier,
                    visual: frames.satisfier,
                },
                fallback_occurred: PerModality {
                    text: text_fallback,
                    narration: narration.fallback_occurred,
                    visual: frames.fallback_occurred,
                },
            },
            story_text,
            audio_url: narration.value,
            frames: frames.value,
        })
    }

    async fn narrate(
        &self,
        request_id: Uuid,
        request: &GenerationRequest,
        policy: &FallbackPolicy,
        story_text: &str,
    ) -> Produced<String> {
        let resolution = self
            .fallback
            .resolve(
                request_id,
                Modality::Narration,
                policy,
                &mut HashSet::new(),
                |provider| async move {
                    provider
                        .synthesize_narration(story_text, request, request.voice.as_deref())
                        .await
                },
            )
            .await;
        let fallback_occurred = resolution.fallback_occurred();
        if let Some((tier, url)) = resolution.outcome {
            return Produced {
                value: url,
                satisfier: Some(tier.into()),
                fallback_occurred,
            };
        }

        let degraded = narration_exhausted(resolution.attempts);
        self.degraded(request_id, Modality::Narration, degraded.satisfier);
        degraded
    }

    async fn illustrate(
        &self,
        request_id: Uuid,
        request: &GenerationRequest,
        policy: &FallbackPolicy,
        story_text: &str,
    ) -> Produced<Vec<String>> {
        let count = request.num_scenes;
        let resolution = self
            .fallback
            .resolve(
                request_id,
                Modality::Visual,
                policy,
                &mut HashSet::new(),
                |provider| async move {
                    let mut frames = provider.create_frames(story_text, request, count).await?;
                    if frames.is_empty() {
                        return Err(ProviderError::Other("provider returned no frames".into()));
                    }
                    frames.truncate(usize::try_from(count).unwrap_or(usize::MAX));
                    Ok(frames)
                },
            )
            .await;
        let fallback_occurred = resolution.fallback_occurred();
        if let Some((tier, frames)) = resolution.outcome {
            return Produced {
                value: frames,
                satisfier: Some(tier.into()),
                fallback_occurred,
            };
        }

        let degraded = visual_exhausted(story_text, request);
        self.degraded(request_id, Modality::Visual, degraded.satisfier);
        degraded
    }

    fn degraded(&self, request_id: Uuid, modality: Modality, to: Option<Satisfier>) {
        self.telemetry.emit(
            Transition::new(TransitionKind::Degraded { to })
                .for_request(request_id)
                .for_modality(modality),
        );
    }
}
