//! Generate Comic use case
//!
//! Orchestrates the full pipeline:
//! concept validation → options → prompt → content → images → assembly → storage.
//!
//! Each stage is a hard gate: a failure aborts the run with a typed
//! [`GenerateComicError`], and nothing after a validation failure touches an
//! external provider.

use crate::config::PipelineParams;
use crate::ports::comic_store::ComicStore;
use crate::ports::content_gateway::ContentGateway;
use crate::ports::image_asset_store::ImageAssetStore;
use crate::ports::image_generator::ImageGenerator;
use crate::ports::pipeline_logger::{EventFields, PipelineEvent};
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::resources::{AdmissionError, PipelineContext};
use crate::use_cases::build_prompt::{BuildPromptError, BuildPromptUseCase};
use crate::use_cases::generate_content::{ContentGenerationError, GenerateContentUseCase};
use crate::use_cases::render_images::{RenderError, RenderImagesUseCase};
use crate::use_cases::shared::elapsed_ms;
use math_comic_domain::{
    ComicAssembler, ConceptValidator, ErrorResponse, GenerationOptions, MathConcept,
    MultiPanelComic, OptionsInput, OptionsProcessor, Stage,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can end a pipeline run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateComicError {
    #[error("{message}")]
    InputValidation {
        message: String,
        suggestions: Vec<String>,
    },

    #[error("Inconsistent options: {0}")]
    OptionsInconsistency(String),

    /// Retries exhausted; the response still says `should_retry`
    #[error("{response} (after {attempts} attempts)")]
    ProviderTransient {
        response: ErrorResponse,
        attempts: u32,
    },

    #[error("{response}")]
    ProviderPermanent { response: ErrorResponse },

    #[error("Rendering failed: {message}")]
    Rendering { message: String },

    #[error("Storage failed: {0}")]
    Storage(String),

    #[error("Service is overloaded, retry later")]
    Overloaded,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenerateComicError {
    /// Short machine-readable code for event logs
    pub fn code(&self) -> &'static str {
        match self {
            GenerateComicError::InputValidation { .. } => "input_validation",
            GenerateComicError::OptionsInconsistency(_) => "options_inconsistency",
            GenerateComicError::ProviderTransient { .. } => "provider_transient",
            GenerateComicError::ProviderPermanent { .. } => "provider_permanent",
            GenerateComicError::Rendering { .. } => "rendering",
            GenerateComicError::Storage(_) => "storage",
            GenerateComicError::Overloaded => "overloaded",
            GenerateComicError::Cancelled => "cancelled",
            GenerateComicError::Internal(_) => "internal",
        }
    }

    /// Reduce to the externally visible failure shape
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            GenerateComicError::InputValidation {
                message,
                suggestions,
            } => ErrorResponse::permanent(message.clone(), suggestions.clone()),
            GenerateComicError::OptionsInconsistency(message) => ErrorResponse::permanent(
                format!("These comic options do not work together: {}", message),
                vec![
                    "Adjust the options, or omit them to use the defaults".to_string(),
                ],
            ),
            GenerateComicError::ProviderTransient { response, .. }
            | GenerateComicError::ProviderPermanent { response } => response.clone(),
            GenerateComicError::Rendering { .. } => ErrorResponse::permanent(
                "The comic panels could not be drawn",
                vec![
                    "Try again with a different topic wording".to_string(),
                    "Check the image provider configuration".to_string(),
                ],
            ),
            GenerateComicError::Storage(_) => ErrorResponse::permanent(
                "The comic was created but could not be saved",
                vec!["Check free space and permissions of the data directory".to_string()],
            ),
            GenerateComicError::Overloaded => AdmissionError::Overloaded.to_error_response(),
            GenerateComicError::Cancelled => AdmissionError::Cancelled.to_error_response(),
            GenerateComicError::Internal(_) => ErrorResponse::permanent(
                "Something went wrong while creating the comic",
                vec!["Try again later".to_string()],
            ),
        }
    }
}

impl From<AdmissionError> for GenerateComicError {
    fn from(e: AdmissionError) -> Self {
        match e {
            AdmissionError::Overloaded | AdmissionError::Closed => GenerateComicError::Overloaded,
            AdmissionError::Cancelled => GenerateComicError::Cancelled,
        }
    }
}

impl From<BuildPromptError> for GenerateComicError {
    fn from(e: BuildPromptError) -> Self {
        match e {
            BuildPromptError::Invalid { message, .. } => GenerateComicError::Internal(format!(
                "generated prompt failed validation: {}",
                message
            )),
            BuildPromptError::Cancelled => GenerateComicError::Cancelled,
        }
    }
}

impl From<ContentGenerationError> for GenerateComicError {
    fn from(e: ContentGenerationError) -> Self {
        match e {
            ContentGenerationError::Transient { response, attempts } => {
                GenerateComicError::ProviderTransient { response, attempts }
            }
            ContentGenerationError::Permanent { response, .. } => {
                GenerateComicError::ProviderPermanent { response }
            }
            ContentGenerationError::Cancelled => GenerateComicError::Cancelled,
        }
    }
}

impl From<RenderError> for GenerateComicError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Cancelled => GenerateComicError::Cancelled,
            other => GenerateComicError::Rendering {
                message: other.to_string(),
            },
        }
    }
}

/// Input for the GenerateComic use case
#[derive(Debug, Clone, Default)]
pub struct GenerateComicInput {
    /// Raw topic text from the caller
    pub topic: String,
    pub options: Option<OptionsInput>,
}

impl GenerateComicInput {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: OptionsInput) -> Self {
        self.options = Some(options);
        self
    }
}

/// Use case for generating and storing a comic
pub struct GenerateComicUseCase<G, I, A, S>
where
    G: ContentGateway + 'static,
    I: ImageGenerator + 'static,
    A: ImageAssetStore + 'static,
    S: ComicStore + 'static,
{
    validator: ConceptValidator,
    processor: OptionsProcessor,
    prompts: BuildPromptUseCase<G>,
    content: GenerateContentUseCase<G>,
    images: RenderImagesUseCase<I, A>,
    store: Arc<S>,
    params: PipelineParams,
}

impl<G, I, A, S> GenerateComicUseCase<G, I, A, S>
where
    G: ContentGateway + 'static,
    I: ImageGenerator + 'static,
    A: ImageAssetStore + 'static,
    S: ComicStore + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        generator: Arc<I>,
        assets: Arc<A>,
        store: Arc<S>,
        params: PipelineParams,
    ) -> Self {
        Self {
            validator: ConceptValidator::default(),
            processor: OptionsProcessor::default(),
            prompts: BuildPromptUseCase::new(Arc::clone(&gateway), params.optimize_prompt),
            content: GenerateContentUseCase::new(gateway, params.retry.clone()),
            images: RenderImagesUseCase::new(generator, assets),
            store,
            params,
        }
    }

    pub fn with_validator(mut self, validator: ConceptValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_options_processor(mut self, processor: OptionsProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: GenerateComicInput,
        ctx: &PipelineContext,
    ) -> Result<MultiPanelComic, GenerateComicError> {
        self.execute_with_progress(input, ctx, &NoProgress).await
    }

    /// Execute and reduce any failure to an [`ErrorResponse`]
    pub async fn execute_for_response(
        &self,
        input: GenerateComicInput,
        ctx: &PipelineContext,
        progress: &dyn PipelineProgress,
    ) -> Result<MultiPanelComic, ErrorResponse> {
        self.execute_with_progress(input, ctx, progress)
            .await
            .map_err(|e| e.to_error_response())
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: GenerateComicInput,
        ctx: &PipelineContext,
        progress: &dyn PipelineProgress,
    ) -> Result<MultiPanelComic, GenerateComicError> {
        let started = Instant::now();
        info!(request_id = %ctx.request_id, "Generating comic for '{}'", input.topic);

        let result = self.run(&input, ctx, progress).await;

        let mut fields = EventFields::new(&ctx.request_id)
            .duration_ms(elapsed_ms(started))
            .success(result.is_ok());
        match &result {
            Ok(comic) => {
                info!(id = %comic.id, panels = comic.panel_count(), "Comic '{}' created", comic.title);
                fields = fields.extra("comic_id", comic.id.as_str());
            }
            Err(e) => {
                warn!(code = e.code(), "Comic generation failed: {}", e);
                fields = fields.error_code(e.code()).message(e.to_string());
            }
        }
        ctx.logger
            .log(PipelineEvent::new("pipeline_complete", fields));

        result
    }

    async fn run(
        &self,
        input: &GenerateComicInput,
        ctx: &PipelineContext,
        progress: &dyn PipelineProgress,
    ) -> Result<MultiPanelComic, GenerateComicError> {
        let _slot = ctx
            .resources
            .admit_pipeline(&ctx.cancellation)
            .await
            .map_err(GenerateComicError::from)?;

        // Stage 1: Concept
        let t = self.stage_start(Stage::ConceptValidation, ctx, progress)?;
        let result = self.validate_concept(&input.topic, ctx);
        let concept = self.stage_end(Stage::ConceptValidation, t, result, ctx, progress)?;

        // Stage 2: Options
        let t = self.stage_start(Stage::OptionsProcessing, ctx, progress)?;
        let result = self.process_options(input.options.clone(), ctx);
        let options = self.stage_end(Stage::OptionsProcessing, t, result, ctx, progress)?;

        // Stage 3: Prompt
        let t = self.stage_start(Stage::PromptBuilding, ctx, progress)?;
        let result = self
            .prompts
            .execute(&concept, &options, ctx)
            .await
            .map_err(GenerateComicError::from);
        let prompt = self.stage_end(Stage::PromptBuilding, t, result, ctx, progress)?;

        // Stage 4: Content
        let t = self.stage_start(Stage::ContentGeneration, ctx, progress)?;
        let result = self
            .content
            .generate_with_progress(&prompt, ctx, progress)
            .await
            .map_err(GenerateComicError::from);
        let content = self.stage_end(Stage::ContentGeneration, t, result, ctx, progress)?;

        // Stage 5: Images
        let t = self.stage_start(Stage::ImageRendering, ctx, progress)?;
        let result = self
            .images
            .generate_all_with_progress(&content.panels, &options, ctx, progress)
            .await
            .map_err(GenerateComicError::from);
        let file_names = self.stage_end(Stage::ImageRendering, t, result, ctx, progress)?;
        let images = self.images.image_refs(&file_names);

        // Stage 6: Assembly
        let t = self.stage_start(Stage::Assembly, ctx, progress)?;
        let result = ComicAssembler::assemble(&concept, &options, content, images)
            .map_err(|e| GenerateComicError::Internal(e.to_string()));
        let comic = self.stage_end(Stage::Assembly, t, result, ctx, progress)?;

        // Stage 7: Storage
        let t = self.stage_start(Stage::Storage, ctx, progress)?;
        let result = self.save_with_retry(&comic).await;
        self.stage_end(Stage::Storage, t, result, ctx, progress)?;

        Ok(comic)
    }

    fn validate_concept(
        &self,
        topic: &str,
        ctx: &PipelineContext,
    ) -> Result<MathConcept, GenerateComicError> {
        let validation = self.validator.validate_input(topic);

        ctx.logger.log(PipelineEvent::new(
            "validation",
            EventFields::new(&ctx.request_id)
                .stage(Stage::ConceptValidation)
                .success(validation.is_valid())
                .message(validation.error_message().to_string())
                .extra("input_chars", topic.chars().count()),
        ));

        if !validation.is_valid() {
            let (_, message, suggestions) = validation.into_parts();
            return Err(GenerateComicError::InputValidation {
                message,
                suggestions,
            });
        }

        let concept = self
            .validator
            .parse_math_concept(topic)
            .map_err(|e| GenerateComicError::Internal(e.to_string()))?;
        debug!(
            topic = concept.topic(),
            keywords = ?concept.keywords(),
            "Concept extracted"
        );
        Ok(concept)
    }

    fn process_options(
        &self,
        input: Option<OptionsInput>,
        ctx: &PipelineContext,
    ) -> Result<GenerationOptions, GenerateComicError> {
        let options = self.processor.apply_defaults(input);

        let validation = self.processor.validate_options(&options);
        if !validation.is_valid() {
            return Err(GenerateComicError::OptionsInconsistency(
                validation.error_message().to_string(),
            ));
        }

        let age_group = options.age_group;
        let requested = options.panel_count;
        let adjusted = self.processor.adjust_for_age_group(options, age_group);
        if adjusted.panel_count != requested {
            info!(
                age = %age_group,
                requested,
                panels = adjusted.panel_count,
                "Panel count clamped for audience"
            );
            ctx.logger.log(PipelineEvent::new(
                "options_clamped",
                EventFields::new(&ctx.request_id)
                    .stage(Stage::OptionsProcessing)
                    .message(format!(
                        "{} panels reduced to {} for {}",
                        requested, adjusted.panel_count, age_group
                    ))
                    .extra("requested_panels", requested)
                    .extra("panel_count", adjusted.panel_count),
            ));
        }
        if let Some(reason) = self.processor.inconsistency(&adjusted) {
            return Err(GenerateComicError::OptionsInconsistency(reason));
        }

        debug!(
            age = %adjusted.age_group,
            panels = adjusted.panel_count,
            style = %adjusted.style,
            "Options resolved"
        );
        Ok(adjusted)
    }

    async fn save_with_retry(&self, comic: &MultiPanelComic) -> Result<(), GenerateComicError> {
        let mut retries = 0;
        loop {
            match self.store.save_comic(comic).await {
                Ok(_) => return Ok(()),
                Err(e) if retries < self.params.save_retries => {
                    retries += 1;
                    warn!("Saving comic {} failed, retrying: {}", comic.id, e);
                }
                Err(e) => return Err(GenerateComicError::Storage(e.to_string())),
            }
        }
    }

    fn stage_start(
        &self,
        stage: Stage,
        ctx: &PipelineContext,
        progress: &dyn PipelineProgress,
    ) -> Result<Instant, GenerateComicError> {
        if ctx.is_cancelled() {
            return Err(GenerateComicError::Cancelled);
        }
        debug!("Stage {}/{}: {}", stage.position(), Stage::ALL.len(), stage);
        progress.on_stage_start(&stage);
        Ok(Instant::now())
    }

    fn stage_end<T>(
        &self,
        stage: Stage,
        started: Instant,
        result: Result<T, GenerateComicError>,
        ctx: &PipelineContext,
        progress: &dyn PipelineProgress,
    ) -> Result<T, GenerateComicError> {
        let success = result.is_ok();
        progress.on_stage_complete(&stage, success);

        let mut fields = EventFields::new(&ctx.request_id)
            .stage(stage)
            .duration_ms(elapsed_ms(started))
            .success(success);
        if let Err(e) = &result {
            fields = fields.error_code(e.code());
        }
        ctx.logger.log(PipelineEvent::new("stage_complete", fields));

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::comic_store::StoreError;
    use crate::ports::pipeline_logger::PipelineLogger;
    use crate::resources::{AdmissionPolicy, ResourceManager};
    use crate::use_cases::render_images::test_support::{MemoryAssetStore, ScriptedImageGenerator};
    use async_trait::async_trait;
    use math_comic_domain::{
        AgeGroup, ApiError, ApiErrorCode, ComicMetadata, ComicStatistics, ComicStyle,
        ExportFormat, RetryPolicy,
    };
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ==================== Test doubles ====================

    struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, ApiError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Result<String, ApiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentGateway for ScriptedGateway {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::unavailable("script exhausted")))
        }
    }

    #[derive(Default)]
    struct MemoryComicStore {
        comics: Mutex<HashMap<String, MultiPanelComic>>,
        failures_left: AtomicUsize,
        save_calls: AtomicUsize,
    }

    impl MemoryComicStore {
        fn failing(times: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(times),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ComicStore for MemoryComicStore {
        async fn save_comic(&self, comic: &MultiPanelComic) -> Result<String, StoreError> {
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.comics
                .lock()
                .unwrap()
                .insert(comic.id.clone(), comic.clone());
            Ok(comic.id.clone())
        }

        async fn load_comic(&self, id: &str) -> Result<Option<MultiPanelComic>, StoreError> {
            Ok(self.comics.lock().unwrap().get(id).cloned())
        }

        async fn list_comics(&self) -> Result<Vec<ComicMetadata>, StoreError> {
            Ok(self
                .comics
                .lock()
                .unwrap()
                .values()
                .map(|c| c.metadata(0))
                .collect())
        }

        async fn delete_comic(&self, id: &str) -> Result<bool, StoreError> {
            Ok(self.comics.lock().unwrap().remove(id).is_some())
        }

        async fn export_comic(
            &self,
            id: &str,
            _format: ExportFormat,
        ) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }

        async fn get_statistics(&self) -> Result<ComicStatistics, StoreError> {
            let list = self.list_comics().await?;
            Ok(ComicStatistics::from_metadata(&list))
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<PipelineEvent>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn log(&self, event: PipelineEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    // ==================== Helpers ====================

    type TestUseCase = GenerateComicUseCase<
        ScriptedGateway,
        ScriptedImageGenerator,
        MemoryAssetStore,
        MemoryComicStore,
    >;

    struct Harness {
        use_case: TestUseCase,
        gateway: Arc<ScriptedGateway>,
        generator: Arc<ScriptedImageGenerator>,
        store: Arc<MemoryComicStore>,
    }

    fn harness_with(
        replies: Vec<Result<String, ApiError>>,
        generator: ScriptedImageGenerator,
        store: MemoryComicStore,
    ) -> Harness {
        let gateway = Arc::new(ScriptedGateway::new(replies));
        let generator = Arc::new(generator);
        let store = Arc::new(store);
        let params = PipelineParams::default().with_retry(RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        });
        let use_case = GenerateComicUseCase::new(
            Arc::clone(&gateway),
            Arc::clone(&generator),
            Arc::new(MemoryAssetStore::default()),
            Arc::clone(&store),
            params,
        );
        Harness {
            use_case,
            gateway,
            generator,
            store,
        }
    }

    fn harness(replies: Vec<Result<String, ApiError>>) -> Harness {
        harness_with(
            replies,
            ScriptedImageGenerator::default(),
            MemoryComicStore::default(),
        )
    }

    fn script(panels: usize) -> String {
        let panels: Vec<_> = (1..=panels)
            .map(|i| {
                serde_json::json!({
                    "image_description": format!("Mia adds {} apples", i),
                    "dialogue": [format!("{} + 1 = {}", i, i + 1)],
                    "narration": format!("Step {}", i),
                })
            })
            .collect();
        serde_json::json!({"title": "Mia Learns Addition", "panels": panels}).to_string()
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_generates_and_stores_comic() {
        let h = harness(vec![Ok(script(4))]);

        let comic = h
            .use_case
            .execute(GenerateComicInput::new("加法运算"), &PipelineContext::default())
            .await
            .unwrap();

        assert_eq!(comic.title, "Mia Learns Addition");
        assert_eq!(comic.topic, "加法运算");
        assert_eq!(comic.panel_count(), comic.options.panel_count as usize);
        for (i, panel) in comic.panels.iter().enumerate() {
            assert_eq!(panel.number as usize, i + 1);
            assert_eq!(panel.content.image_description, format!("Mia adds {} apples", i + 1));
            assert!(panel.image.file_name.starts_with(&format!("panel_{:02}_", i + 1)));
        }

        let stored = h.store.load_comic(&comic.id).await.unwrap();
        assert_eq!(stored, Some(comic));
        assert_eq!(h.gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_math_topic_never_reaches_provider() {
        let h = harness(vec![Ok(script(4))]);

        let err = h
            .use_case
            .execute(GenerateComicInput::new("今天天气"), &PipelineContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateComicError::InputValidation { .. }));
        let response = err.to_error_response();
        assert!(!response.should_retry);
        assert!(!response.resolution_steps.is_empty());
        assert_eq!(h.gateway.calls(), 0);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inconsistent_options_rejected_before_provider() {
        let h = harness(vec![Ok(script(4))]);
        let input = GenerateComicInput::new("加法运算").with_options(OptionsInput {
            age_group: Some(AgeGroup::Teen),
            style: Some(ComicStyle::Storybook),
            include_narration: Some(false),
            ..Default::default()
        });

        let err = h
            .use_case
            .execute(input, &PipelineContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateComicError::OptionsInconsistency(_)));
        assert_eq!(h.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_out_of_bound_panel_count_rejected() {
        let h = harness(vec![]);
        let input = GenerateComicInput::new("加法运算").with_options(OptionsInput {
            panel_count: Some(20),
            ..Default::default()
        });

        let err = h
            .use_case
            .execute(input, &PipelineContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateComicError::OptionsInconsistency(_)));
    }

    #[tokio::test]
    async fn test_child_audience_clamps_panel_count() {
        let h = harness(vec![Ok(script(4))]);
        let input = GenerateComicInput::new("加法运算").with_options(OptionsInput {
            age_group: Some(AgeGroup::Child),
            panel_count: Some(8),
            ..Default::default()
        });

        let comic = h
            .use_case
            .execute(input, &PipelineContext::default())
            .await
            .unwrap();
        assert_eq!(comic.panel_count(), 4);
    }

    #[tokio::test]
    async fn test_panel_clamp_is_logged() {
        let h = harness(vec![Ok(script(4))]);
        let logger = Arc::new(RecordingLogger::default());
        let ctx = PipelineContext::new(Default::default(), logger.clone());
        let input = GenerateComicInput::new("加法运算").with_options(OptionsInput {
            age_group: Some(AgeGroup::Child),
            panel_count: Some(8),
            ..Default::default()
        });

        h.use_case.execute(input, &ctx).await.unwrap();

        let events = logger.events.lock().unwrap();
        let clamp = events
            .iter()
            .find(|e| e.event_type == "options_clamped")
            .unwrap();
        assert_eq!(clamp.fields.stage, Some(Stage::OptionsProcessing));
        assert_eq!(clamp.fields.extra.get("requested_panels"), Some(&serde_json::json!(8)));
        assert_eq!(clamp.fields.extra.get("panel_count"), Some(&serde_json::json!(4)));
    }

    #[tokio::test]
    async fn test_unclamped_options_log_nothing_extra() {
        let h = harness(vec![Ok(script(4))]);
        let logger = Arc::new(RecordingLogger::default());
        let ctx = PipelineContext::new(Default::default(), logger.clone());

        h.use_case
            .execute(GenerateComicInput::new("加法运算"), &ctx)
            .await
            .unwrap();

        let events = logger.events.lock().unwrap();
        assert!(!events.iter().any(|e| e.event_type == "options_clamped"));
    }

    #[tokio::test]
    async fn test_transient_exhaustion_keeps_should_retry() {
        let h = harness(vec![
            Err(ApiError::new(ApiErrorCode::RateLimited, "1")),
            Err(ApiError::new(ApiErrorCode::RateLimited, "2")),
            Err(ApiError::new(ApiErrorCode::RateLimited, "3")),
        ]);

        let err = h
            .use_case
            .execute(GenerateComicInput::new("加法运算"), &PipelineContext::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerateComicError::ProviderTransient { attempts: 3, .. }
        ));
        assert!(err.to_error_response().should_retry);
        assert_eq!(h.gateway.calls(), 3);
        assert!(h.store.comics.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_provider_error_single_call() {
        let h = harness(vec![Err(ApiError::new(
            ApiErrorCode::ContentFiltered,
            "blocked",
        ))]);

        let response = h
            .use_case
            .execute_for_response(
                GenerateComicInput::new("加法运算"),
                &PipelineContext::default(),
                &NoProgress,
            )
            .await
            .unwrap_err();

        assert!(!response.should_retry);
        assert!(!response.resolution_steps.is_empty());
        assert_eq!(h.gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_produces_no_comic() {
        let mut failing = HashMap::new();
        failing.insert(3, ApiError::new(ApiErrorCode::ServerError, "boom"));
        let h = harness_with(
            vec![Ok(script(4))],
            ScriptedImageGenerator {
                failing,
                ..Default::default()
            },
            MemoryComicStore::default(),
        );

        let err = h
            .use_case
            .execute(GenerateComicInput::new("加法运算"), &PipelineContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateComicError::Rendering { .. }));
        assert!(!err.to_error_response().should_retry);
        assert_eq!(h.store.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_is_retried_once() {
        let h = harness_with(
            vec![Ok(script(4))],
            ScriptedImageGenerator::default(),
            MemoryComicStore::failing(1),
        );

        let comic = h
            .use_case
            .execute(GenerateComicInput::new("加法运算"), &PipelineContext::default())
            .await
            .unwrap();

        assert_eq!(h.store.save_calls.load(Ordering::SeqCst), 2);
        assert!(h.store.load_comic(&comic.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_failure_surfaces_after_retry() {
        let h = harness_with(
            vec![Ok(script(4))],
            ScriptedImageGenerator::default(),
            MemoryComicStore::failing(2),
        );

        let err = h
            .use_case
            .execute(GenerateComicInput::new("加法运算"), &PipelineContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateComicError::Storage(_)));
        assert_eq!(h.store.save_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reject_admission_when_full() {
        let h = harness(vec![Ok(script(4))]);
        let resources = Arc::new(ResourceManager::new(4, 1, AdmissionPolicy::Reject));
        let ctx = PipelineContext::new(Arc::clone(&resources), Arc::new(RecordingLogger::default()));
        let _held = resources.admit_pipeline(&ctx.cancellation).await.unwrap();

        let err = h
            .use_case
            .execute(GenerateComicInput::new("加法运算"), &ctx)
            .await
            .unwrap_err();

        assert_eq!(err, GenerateComicError::Overloaded);
        let response = err.to_error_response();
        assert!(response.should_retry);
        assert_eq!(response.retry_after, Some(Duration::from_secs(5)));
        assert_eq!(h.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let h = harness(vec![Ok(script(4))]);
        let ctx = PipelineContext::default();
        ctx.cancellation.cancel();

        let err = h
            .use_case
            .execute(GenerateComicInput::new("加法运算"), &ctx)
            .await
            .unwrap_err();

        assert_eq!(err, GenerateComicError::Cancelled);
        assert_eq!(h.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_logs_stage_events_and_outcome() {
        let h = harness(vec![Ok(script(4))]);
        let logger = Arc::new(RecordingLogger::default());
        let ctx = PipelineContext::new(Default::default(), logger.clone());

        h.use_case
            .execute(GenerateComicInput::new("加法运算"), &ctx)
            .await
            .unwrap();

        let events = logger.events.lock().unwrap();
        let stages: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == "stage_complete")
            .filter_map(|e| e.fields.stage)
            .collect();
        assert_eq!(stages, Stage::ALL.to_vec());

        let last = events.last().unwrap();
        assert_eq!(last.event_type, "pipeline_complete");
        assert_eq!(last.fields.success, Some(true));
        assert!(events.iter().any(|e| e.event_type == "validation"));
    }
}
