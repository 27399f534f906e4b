//! Subflux command line entry point: HTTP server and local translation tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subflux::batch::{archive_key, BatchProcessor, BatchRequest};
use subflux::billing::CreditPolicy;
use subflux::cli::{collect_subtitle_files, Args, Commands};
use subflux::config::{AiService, Config, Environment};
use subflux::context::AppContext;
use subflux::model::BatchStatus;
use subflux::storage::{ArtifactStore, MemoryArtifactStore};
use subflux::stream::translated_file_name;
use subflux::subtitle;
use subflux::translate::{ProgressCallback, QualityTier, TranslationProgress};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the file writer flushing until exit
    let _guard = setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env_overrides();

    match args.command {
        Commands::Serve { port, dev } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if dev {
                config.environment = Environment::Development;
            }
            if config.environment.is_development() {
                warn!("Development mode: credit billing is disabled");
            }
            let context = AppContext::from_config(config)?;
            subflux::server::serve(context).await?;
        }
        Commands::Translate {
            input,
            output,
            target_lang,
            source_lang,
            tier,
            service,
        } => {
            let tier = QualityTier::parse(&tier)?;
            let service = parse_service(service.as_deref(), &config)?;
            translate_file(config, &input, output, &target_lang, source_lang.as_deref(), tier, service).await?;
        }
        Commands::Batch {
            input_dir,
            target_lang,
            output,
            source_lang,
            service,
        } => {
            let service = parse_service(service.as_deref(), &config)?;
            translate_directory(config, &input_dir, &output, &target_lang, source_lang, service).await?;
        }
        Commands::Estimate { input, tier } => {
            let tier = QualityTier::parse(&tier)?;
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let entries = subtitle::parse_srt(&content)?;
            let policy = CreditPolicy::new(&config.billing);
            let batches = entries.len().div_ceil(policy.batch_size().max(1));

            println!("\nCredit estimate for {}", input.display());
            println!("{:<14} {}", "Subtitles:", entries.len());
            println!("{:<14} {}", "Characters:", subtitle::character_count(&entries));
            println!("{:<14} {}", "Batches:", batches);
            println!("{:<14} {} ({} per batch)", "Tier:", tier.as_str(), policy.rate(tier));
            println!("{:<14} {:.2}", "Credits:", policy.required(entries.len(), tier));
        }
        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<non_blocking::WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".subflux").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "subflux.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subflux.log").display()
    );

    Ok(guard)
}

fn parse_service(value: Option<&str>, config: &Config) -> Result<AiService> {
    Ok(match value {
        Some(value) => AiService::parse(value)?,
        None => config.translate.service,
    })
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn translate_file(
    mut config: Config,
    input: &Path,
    output: Option<PathBuf>,
    target: &str,
    source: Option<&str>,
    tier: QualityTier,
    service: AiService,
) -> Result<()> {
    info!("Translating subtitles: {}", input.display());
    config.environment = Environment::Development;

    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let entries = subtitle::parse_srt(&content)?;
    if entries.is_empty() {
        anyhow::bail!("No subtitles found in {}", input.display());
    }

    let context = AppContext::from_config(config)?;
    let backend = context.backends.backend(service, tier)?;

    let pb = progress_bar(entries.len() as u64);
    let bar = pb.clone();
    let progress: ProgressCallback = Arc::new(move |p: TranslationProgress| {
        bar.set_length(p.total as u64);
        bar.set_position(p.current as u64);
        bar.set_message(p.message);
    });

    let translated = backend.translate(&entries, target, source, progress).await;
    pb.finish_and_clear();
    let translated = translated?;

    let output = output.unwrap_or_else(|| {
        let name = translated_file_name(&input.to_string_lossy(), target);
        input.with_file_name(name)
    });
    tokio::fs::write(&output, subtitle::generate_srt(&translated)).await?;

    println!(
        "Translated {} subtitles ({} characters) to {}",
        translated.len(),
        subtitle::character_count(&translated),
        output.display()
    );
    Ok(())
}

async fn translate_directory(
    mut config: Config,
    input_dir: &Path,
    output: &Path,
    target: &str,
    source: Option<String>,
    service: AiService,
) -> Result<()> {
    info!("Processing directory: {}", input_dir.display());
    config.environment = Environment::Development;

    let files = collect_subtitle_files(input_dir)?;
    if files.is_empty() {
        anyhow::bail!("No .srt files found under {}", input_dir.display());
    }
    config.batch.max_files = config.batch.max_files.max(files.len());
    info!("Found {} subtitle files to translate", files.len());

    let mut context = AppContext::from_config(config)?;
    let artifacts = Arc::new(MemoryArtifactStore::new());
    context.artifacts = artifacts.clone();

    let name = input_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "subtitles".to_string());

    let processor = BatchProcessor::new(context);
    let pb = progress_bar(files.len() as u64);
    let (job_id, handle) = processor
        .submit(BatchRequest {
            user_id: "local".to_string(),
            name,
            files,
            source_language: source,
            target_language: target.to_string(),
            service,
        })
        .await?;

    while !handle.is_finished() {
        if let Ok(job) = processor.status(job_id, "local").await {
            pb.set_position((job.processed_files + job.failed_files) as u64);
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    handle.await?;
    pb.finish_and_clear();

    let job = processor.status(job_id, "local").await?;
    for file in job.files.iter().filter(|f| f.error.is_some()) {
        warn!("Failed to translate {}: {}", file.file_name, file.error.as_deref().unwrap_or_default());
    }
    if job.status != BatchStatus::Completed {
        anyhow::bail!("Batch failed: none of the {} files could be translated", job.total_files);
    }

    let archive = artifacts.get(&archive_key(&job)).await?;
    tokio::fs::write(output, archive).await?;
    println!(
        "Translated {}/{} files into {}",
        job.processed_files,
        job.total_files,
        output.display()
    );
    Ok(())
}
