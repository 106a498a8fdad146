//! Lifecycle facade
//!
//! Wires one registry, the detection pipeline and the query service together
//! under an [`ArtifactConfig`], so an orchestrator only deals with one type.

use crate::config::{ArtifactConfig, InjectionMode};
use crate::error::RegistrationError;
use crate::query::{ArtifactQueryService, TaskScope};
use crate::tool::{register_artifact, RegisterArtifactRequest};
use coa_artifact::{render_references, Artifact, ArtifactReference};
use coa_detection::{ByteStorage, DetectionPipeline, ExecutionContext, Producer};
use coa_registry::ArtifactRegistry;
use std::sync::Arc;

/// Registry, detection and injection for one orchestrator
#[derive(Debug)]
pub struct ArtifactLifecycle {
    config: ArtifactConfig,
    registry: Arc<ArtifactRegistry>,
    pipeline: DetectionPipeline,
    query: ArtifactQueryService,
}

impl Default for ArtifactLifecycle {
    fn default() -> Self {
        Self::new(ArtifactConfig::default())
    }
}

impl ArtifactLifecycle {
    #[must_use]
    pub fn new(config: ArtifactConfig) -> Self {
        Self::with_registry(config, Arc::new(ArtifactRegistry::new()))
    }

    /// Share an existing registry
    #[must_use]
    pub fn with_registry(config: ArtifactConfig, registry: Arc<ArtifactRegistry>) -> Self {
        let pipeline = DetectionPipeline::new(config.detection.clone());
        let query = ArtifactQueryService::new(Arc::clone(&registry));
        Self {
            config,
            registry,
            pipeline,
            query,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ArtifactConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &DetectionPipeline {
        &self.pipeline
    }

    #[inline]
    #[must_use]
    pub fn query(&self) -> &ArtifactQueryService {
        &self.query
    }

    #[inline]
    #[must_use]
    pub fn injection_mode(&self) -> InjectionMode {
        self.config.injection_mode
    }

    /// Execution context over this lifecycle's registry
    #[must_use]
    pub fn context(&self, storage: Arc<dyn ByteStorage>) -> ExecutionContext {
        ExecutionContext::new(Arc::clone(&self.registry), storage)
    }

    /// References visible to `scope` under the configured mode
    pub async fn references_for(&self, scope: TaskScope<'_>) -> Vec<ArtifactReference> {
        let refs = self.query.for_task(self.config.injection_mode, scope).await;
        tracing::debug!(
            task_id = scope.task_id,
            mode = %self.config.injection_mode,
            count = refs.len(),
            "resolved artifact references"
        );
        refs
    }

    /// `<artifacts>` block for `scope`, empty when nothing is visible
    pub async fn context_block(&self, scope: TaskScope<'_>) -> String {
        render_references(&self.references_for(scope).await)
    }

    /// Explicit registration through this lifecycle's registry
    ///
    /// # Errors
    /// See [`register_artifact`].
    pub async fn register(
        &self,
        ctx: &ExecutionContext,
        producer: &Producer,
        request: &RegisterArtifactRequest,
    ) -> Result<Artifact, RegistrationError> {
        register_artifact(ctx, producer, request).await
    }
}
