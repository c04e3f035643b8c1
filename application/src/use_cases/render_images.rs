//! Render Images use case
//!
//! Renders one image per panel concurrently and stores each under a
//! deterministic, content-derived file name.

use crate::ports::image_asset_store::ImageAssetStore;
use crate::ports::image_generator::{ImageGenerator, ImageRequest};
use crate::ports::pipeline_logger::{EventFields, PipelineEvent};
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::resources::PipelineContext;
use crate::use_cases::shared::{cancellable, elapsed_ms};
use math_comic_domain::{
    ApiError, GenerationOptions, ImageRef, PanelContent, PromptTemplate, Stage,
};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Panel {panel}: image provider failed: {error}")]
    Provider { panel: usize, error: ApiError },

    #[error("Panel {panel}: could not store image: {message}")]
    Asset { panel: usize, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Render task failed: {0}")]
    Internal(String),
}

/// Deterministic file name for a panel image.
///
/// `panel_{NN}_{hash}.png`, where `hash` is the first 16 hex characters of
/// SHA-256 over panel number, style, age group and image description.
pub fn panel_file_name(panel_number: usize, options: &GenerationOptions, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(panel_number.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(options.style.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(options.age_group.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(description.trim().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("panel_{:02}_{}.png", panel_number, &digest[..16])
}

pub struct RenderImagesUseCase<I, A>
where
    I: ImageGenerator + 'static,
    A: ImageAssetStore + 'static,
{
    generator: Arc<I>,
    assets: Arc<A>,
}

impl<I, A> RenderImagesUseCase<I, A>
where
    I: ImageGenerator + 'static,
    A: ImageAssetStore + 'static,
{
    pub fn new(generator: Arc<I>, assets: Arc<A>) -> Self {
        Self { generator, assets }
    }

    pub fn get_image_url(&self, file_name: &str) -> String {
        self.assets.url(file_name)
    }

    pub fn get_image_path(&self, file_name: &str) -> PathBuf {
        self.assets.path(file_name)
    }

    /// Resolve stored file names into image references
    pub fn image_refs(&self, file_names: &[String]) -> Vec<ImageRef> {
        file_names
            .iter()
            .map(|name| ImageRef {
                file_name: name.clone(),
                url: self.get_image_url(name),
                path: self.get_image_path(name).to_string_lossy().into_owned(),
            })
            .collect()
    }

    /// Render and store a single panel image, returning its file name
    pub async fn generate_panel_image(
        &self,
        panel: &PanelContent,
        options: &GenerationOptions,
        panel_number: usize,
        ctx: &PipelineContext,
    ) -> Result<String, RenderError> {
        Self::render_panel(
            Arc::clone(&self.generator),
            Arc::clone(&self.assets),
            ctx.clone(),
            panel.clone(),
            options.clone(),
            panel_number,
        )
        .await
    }

    pub async fn generate_all_panel_images(
        &self,
        panels: &[PanelContent],
        options: &GenerationOptions,
        ctx: &PipelineContext,
    ) -> Result<Vec<String>, RenderError> {
        self.generate_all_with_progress(panels, options, ctx, &NoProgress)
            .await
    }

    /// Render every panel concurrently.
    ///
    /// Output order equals panel order. The first failure (or cancellation)
    /// aborts every remaining panel task.
    pub async fn generate_all_with_progress(
        &self,
        panels: &[PanelContent],
        options: &GenerationOptions,
        ctx: &PipelineContext,
        progress: &dyn PipelineProgress,
    ) -> Result<Vec<String>, RenderError> {
        let total = panels.len();
        info!("Rendering {} panel images", total);

        let mut join_set = JoinSet::new();
        for (index, panel) in panels.iter().enumerate() {
            let generator = Arc::clone(&self.generator);
            let assets = Arc::clone(&self.assets);
            let ctx = ctx.clone();
            let panel = panel.clone();
            let options = options.clone();

            join_set.spawn(async move {
                let result =
                    Self::render_panel(generator, assets, ctx, panel, options, index + 1).await;
                (index, result)
            });
        }

        let mut names: Vec<Option<String>> = vec![None; total];
        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancellation.cancelled() => {
                    join_set.abort_all();
                    return Err(RenderError::Cancelled);
                }
                next = join_set.join_next() => next,
            };

            match next {
                None => break,
                Some(Ok((index, Ok(file_name)))) => {
                    progress.on_panel_complete(index + 1, total);
                    names[index] = Some(file_name);
                }
                Some(Ok((index, Err(e)))) => {
                    warn!("Panel {} failed, aborting remaining panels: {}", index + 1, e);
                    join_set.abort_all();
                    return Err(e);
                }
                Some(Err(e)) => {
                    warn!("Render task join error: {}", e);
                    join_set.abort_all();
                    return Err(RenderError::Internal(e.to_string()));
                }
            }
        }

        names
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| RenderError::Internal("a panel finished without an image".to_string()))
    }

    async fn render_panel(
        generator: Arc<I>,
        assets: Arc<A>,
        ctx: PipelineContext,
        panel: PanelContent,
        options: GenerationOptions,
        panel_number: usize,
    ) -> Result<String, RenderError> {
        let file_name = panel_file_name(panel_number, &options, &panel.image_description);

        // Same name means same panel: reuse an image rendered earlier
        if let Ok(true) = assets.touch(&file_name).await {
            debug!(panel = panel_number, "Reusing stored image {}", file_name);
            return Ok(file_name);
        }

        let _permit = ctx
            .resources
            .acquire_api_permit(&ctx.cancellation)
            .await
            .map_err(|_| RenderError::Cancelled)?;

        let request = ImageRequest {
            prompt: PromptTemplate::panel_image(&panel.image_description, &options, panel_number),
            panel_number,
        };
        let started = Instant::now();
        let fields = EventFields::new(&ctx.request_id)
            .stage(Stage::ImageRendering)
            .extra("panel", panel_number);

        let artifact = match cancellable(&ctx.cancellation, generator.generate_image(&request))
            .await
            .ok_or(RenderError::Cancelled)?
        {
            Ok(artifact) => artifact,
            Err(error) => {
                ctx.logger.log(PipelineEvent::new(
                    "image_error",
                    fields
                        .duration_ms(elapsed_ms(started))
                        .success(false)
                        .error_code(error.code.as_str())
                        .message(error.message.clone()),
                ));
                return Err(RenderError::Provider {
                    panel: panel_number,
                    error,
                });
            }
        };

        let size = cancellable(&ctx.cancellation, assets.store(&file_name, artifact))
            .await
            .ok_or(RenderError::Cancelled)?
            .map_err(|e| RenderError::Asset {
                panel: panel_number,
                message: e.to_string(),
            })?;

        ctx.logger.log(PipelineEvent::new(
            "image_stored",
            fields
                .duration_ms(elapsed_ms(started))
                .success(true)
                .extra("file_name", file_name.as_str())
                .extra("bytes", size),
        ));
        debug!(panel = panel_number, size, "Stored {}", file_name);
        Ok(file_name)
    }
}
