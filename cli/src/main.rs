//! CLI entrypoint for math-comic
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use math_comic_application::{
    ComicStore, GenerateComicInput, GenerateComicUseCase, ImageAssetStore, NoPipelineLogger,
    NoProgress, PipelineContext, PipelineLogger, PipelineProgress,
};
use math_comic_domain::ExportFormat;
use math_comic_infrastructure::{
    ConfigLoader, FileComicStore, FileConfig, JsonlPipelineLogger, LocalImageAssetStore,
    OpenAiContentGateway, OpenAiEndpoint, OpenAiImageGateway,
};
use math_comic_presentation::{
    Cli, Command, ConsoleFormatter, GenerateArgs, OutputFormat, ProgressReporter, SimpleProgress,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;
    ConsoleFormatter::set_color(config.output.color);

    let Some(command) = cli.command else {
        return Err(anyhow!(
            "No command given. Try `math-comic generate \"<topic>\"` or `math-comic --help`."
        ));
    };

    info!("Starting math-comic");

    // === Dependency Injection ===
    let data_dir = config.storage.resolve_data_dir();
    let images = Arc::new(
        LocalImageAssetStore::new(
            data_dir.join("images"),
            config.storage.public_base_url.clone(),
            Duration::from_secs(config.image.timeout_seconds),
        )
        .context("Failed to create HTTP client")?,
    );
    let store = Arc::new(FileComicStore::new(
        data_dir,
        Arc::clone(&images) as Arc<dyn ImageAssetStore>,
    ));

    match command {
        Command::Generate(args) => {
            generate(&config, args, images, store, cli.quiet, cli.verbose).await
        }
        Command::List => {
            let entries = store.list_comics().await?;
            print!("{}", ConsoleFormatter::format_list(&entries));
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { id, output } => match store.load_comic(&id).await? {
            Some(comic) => {
                let text = match output {
                    OutputFormat::Full => ConsoleFormatter::format(&comic),
                    OutputFormat::Json => ConsoleFormatter::format_json(&comic),
                };
                println!("{}", text);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("Comic not found: {}", id);
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Delete { id } => {
            if store.delete_comic(&id).await? {
                println!("Deleted {}", id);
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("Comic not found: {}", id);
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Export { id, format, out } => export(&*store, &id, format, out).await,
        Command::Stats => {
            let stats = store.get_statistics().await?;
            print!("{}", ConsoleFormatter::format_statistics(&stats));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn generate(
    config: &FileConfig,
    args: GenerateArgs,
    images: Arc<LocalImageAssetStore>,
    store: Arc<FileComicStore>,
    quiet: bool,
    verbose: u8,
) -> Result<ExitCode> {
    let content_key = config.provider.resolve_api_key();
    if content_key.is_none() {
        warn!(
            "No API key found in ${}; requests are sent unauthenticated",
            config.provider.api_key_env
        );
    }
    let content_gateway = Arc::new(
        OpenAiContentGateway::new(
            OpenAiEndpoint::new(&config.provider.base_url, &config.provider.model)
                .with_api_key(content_key)
                .with_timeout(Duration::from_secs(config.provider.timeout_seconds)),
            config.provider.temperature,
        )
        .context("Failed to create HTTP client")?,
    );
    let image_gateway = Arc::new(
        OpenAiImageGateway::new(
            OpenAiEndpoint::new(&config.image.base_url, &config.image.model)
                .with_api_key(config.image.resolve_api_key())
                .with_timeout(Duration::from_secs(config.image.timeout_seconds)),
            &config.image.size,
        )
        .context("Failed to create HTTP client")?,
    );

    let logger: Arc<dyn PipelineLogger> = match &config.logging.event_log {
        Some(path) => match JsonlPipelineLogger::new(path, config.logging.queue_capacity) {
            Some(logger) => {
                info!("Pipeline events: {}", logger.path().display());
                Arc::new(logger)
            }
            None => Arc::new(NoPipelineLogger),
        },
        None => Arc::new(NoPipelineLogger),
    };

    let ctx = PipelineContext::new(Arc::new(config.resource_manager()), logger);

    // Ctrl-C cancels the run; the pipeline stops at its next suspension point
    let cancellation = ctx.cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancellation.cancel();
        }
    });

    let use_case = GenerateComicUseCase::new(
        content_gateway,
        image_gateway,
        images,
        store,
        config.pipeline_params(),
    )
    .with_validator(config.concept_validator())
    .with_options_processor(config.options_processor());

    let mut input = GenerateComicInput::new(args.topic.clone());
    if let Some(options) = args.options_input() {
        input = input.with_options(options);
    }

    // Bars and log lines fight over stderr, so verbose runs get plain lines
    let progress: Box<dyn PipelineProgress> = if quiet {
        Box::new(NoProgress)
    } else if verbose > 0 {
        Box::new(SimpleProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    let result = use_case
        .execute_for_response(input, &ctx, progress.as_ref())
        .await;
    drop(progress);

    match result {
        Ok(comic) => {
            let output = match args.output {
                OutputFormat::Full => ConsoleFormatter::format(&comic),
                OutputFormat::Json => ConsoleFormatter::format_json(&comic),
            };
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprint!("{}", ConsoleFormatter::format_error(&error));
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn export(
    store: &dyn ComicStore,
    id: &str,
    format: ExportFormat,
    out: Option<PathBuf>,
) -> Result<ExitCode> {
    let bytes = store
        .export_comic(id, format)
        .await
        .with_context(|| format!("Export of {} as {} failed", id, format))?;

    match out {
        Some(path) if path.as_os_str() == "-" => {
            std::io::stdout().write_all(&bytes)?;
        }
        out => {
            let path = out.unwrap_or_else(|| PathBuf::from(format!("{}.{}", id, format.extension())));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} ({} bytes)", path.display(), bytes.len());
        }
    }
    Ok(ExitCode::SUCCESS)
}
