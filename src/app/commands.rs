//! Subcommand handlers.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use clipfetch_core::catalog::{self, FormatAxis};
use clipfetch_core::{
    DirectorySink, DownloadJobCoordinator, FormatList, FormatsState, HealthMonitor, HealthStatus,
    InfoResolver, JobOptions, JobOutcome, MediaReference, ResolvedMedia, SharedHealth,
    ValidationError, classify,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::app::{exit_handler, progress_manager::JobProgress, terminal};
use crate::cli::DownloadArgs;
use crate::output;

pub(crate) async fn run_detect(ctx: &RunContext, url: &str, remote: bool) -> Result<ProcessExit> {
    let url = url.trim();
    if url.is_empty() {
        bail!(ValidationError::EmptyUrl);
    }

    if let Some(platform) = ctx.platform {
        let reference = MediaReference::for_platform(url, platform)?;
        println!("{}", reference.platform().as_str());
        return Ok(ProcessExit::Success);
    }

    let platform = match classify(url) {
        Some(platform) => Some(platform),
        None if remote => {
            debug!(url, "no local pattern matched; asking the service");
            ctx.api
                .detect_platform(url)
                .await
                .map_err(|error| anyhow!(error.user_message()))?
        }
        None => None,
    };

    let Some(platform) = platform else {
        bail!(ValidationError::unsupported(url));
    };
    println!("{}", platform.as_str());
    Ok(ProcessExit::Success)
}

pub(crate) async fn run_info(ctx: &RunContext, url: &str) -> Result<ProcessExit> {
    let media = resolve(ctx, url).await?;
    let width = output::terminal_width();
    output::print_lines(&output::metadata_lines(
        &media.metadata,
        media.reference.platform(),
        width,
    ));

    match &media.formats {
        FormatsState::Loaded(list) => {
            for axis in [FormatAxis::Video, FormatAxis::Audio] {
                println!();
                println!("{} formats:", capitalize(&axis.to_string()));
                output::print_lines(&output::format_table_lines(
                    &catalog::filter(&list.formats, axis),
                    axis,
                ));
            }
            Ok(ProcessExit::Success)
        }
        FormatsState::Failed(message) => {
            eprintln!("Formats unavailable: {message}");
            Ok(ProcessExit::Partial)
        }
        FormatsState::Pending => Ok(ProcessExit::Partial),
    }
}

pub(crate) async fn run_formats(ctx: &RunContext, url: &str, audio: bool) -> Result<ProcessExit> {
    let media = resolve(ctx, url).await?;
    let axis = if audio { FormatAxis::Audio } else { FormatAxis::Video };
    let list = loaded_formats(&media)?;
    output::print_lines(&output::format_table_lines(
        &catalog::filter(&list.formats, axis),
        axis,
    ));
    Ok(ProcessExit::Success)
}

pub(crate) async fn run_health(ctx: &RunContext) -> Result<ProcessExit> {
    let status: HealthStatus = ctx
        .api
        .health()
        .await
        .map_err(|error| anyhow!(error.user_message()))?
        .into();
    output::print_lines(&output::health_lines(&status));
    Ok(ProcessExit::Success)
}

pub(crate) async fn run_download(ctx: &RunContext, args: DownloadArgs) -> Result<ProcessExit> {
    let media = resolve(ctx, &args.url).await?;
    let list = loaded_formats(&media)?;
    let axis = if args.audio { FormatAxis::Audio } else { FormatAxis::Video };

    let selected = match args.format.as_deref() {
        Some(format_id) => Some(
            catalog::find(&list.formats, format_id)
                .cloned()
                .ok_or_else(|| anyhow!("Format '{format_id}' is not offered for this media"))?,
        ),
        None => catalog::default_selection(&list.formats, axis),
    };
    if let Some(format) = &selected {
        info!(format_id = %format.format_id, quality = %format.quality, "format selected");
    }

    let options = JobOptions {
        convert_to_audio_only: args.mp3,
        audio_bitrate_kbps: ctx.audio_bitrate(args.bitrate),
        merge_with_best_audio: !args.no_merge,
        title: Some(media.metadata.title.clone()).filter(|title| !title.is_empty()),
    };

    let shared = SharedHealth::new();
    let monitor = HealthMonitor::new(ctx.api.clone(), shared.clone());
    let status = monitor.refresh().await;
    if let Some(warning) = &status.credential_warning {
        warn!("{warning}");
    }
    let mut health_task = monitor.start(ctx.health_interval());

    let sink = DirectorySink::new(
        ctx.api.transfer_http().clone(),
        ctx.output_dir(args.output_dir),
    );
    let mut coordinator = DownloadJobCoordinator::new(Arc::new(ctx.api.clone()), Arc::new(sink))
        .with_health(shared.clone());

    let submitted = tokio::select! {
        result = coordinator.submit(&media.reference, selected.as_ref(), options) => Some(result),
        () = shutdown_signal() => None,
    };
    let job_id = match submitted {
        Some(result) => result.map_err(|error| anyhow!(error.user_message()))?,
        None => {
            coordinator.cancel();
            health_task.stop();
            bail!("Download cancelled");
        }
    };
    info!(job_id = %job_id, "download started");

    let progress = JobProgress::new(terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        ctx.quiet,
        terminal::is_dumb_terminal(),
    ));
    let result = coordinator
        .drive(shutdown_signal(), |event| progress.observe(event))
        .await;
    progress.clear();
    health_task.stop();

    let outcome = result.map_err(|error| anyhow!(error.user_message()))?;
    match &outcome {
        JobOutcome::Completed {
            saved_to: Some(path),
            ..
        } => println!("Saved to {}", path.display()),
        JobOutcome::Completed {
            filename,
            transfer_error: Some(error),
            ..
        } => eprintln!("Download of '{filename}' finished but could not be saved: {error}"),
        JobOutcome::Completed { filename, .. } => println!("Download ready: {filename}"),
        JobOutcome::Cancelled => eprintln!("Download cancelled"),
    }
    if let Some(warning) = shared.snapshot().disk_space_warning {
        eprintln!("Warning: {warning}");
    }
    Ok(exit_handler::determine_exit_outcome(&outcome))
}

async fn resolve(ctx: &RunContext, url: &str) -> Result<ResolvedMedia> {
    let reference = ctx.media_reference(url)?;
    InfoResolver::new(ctx.api.clone())
        .resolve(&reference)
        .await
        .map_err(|error| {
            debug!(error = %error, "resolve failed");
            anyhow!(error.user_message())
        })
}

fn loaded_formats(media: &ResolvedMedia) -> Result<&FormatList> {
    match &media.formats {
        FormatsState::Loaded(list) => Ok(list),
        FormatsState::Failed(message) => bail!("Formats unavailable: {message}"),
        FormatsState::Pending => bail!("Formats unavailable"),
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
