use anyhow::Result;
use tracing::debug;

use crate::ProcessExit;
use crate::app::context::RunContext;
use crate::app::{commands, terminal};
use crate::app_config;
use crate::cli::{Args, Command};

pub(crate) async fn run(args: Args) -> Result<ProcessExit> {
    let loaded = app_config::load_default_file_config()?;

    let default_level = terminal::default_log_level(args.quiet, args.verbose, loaded.config.verbosity);
    let no_color = terminal::no_color_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(default_level, no_color);

    debug!(?args, "CLI arguments parsed");
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "config file loaded");
    }

    let ctx = RunContext::new(args.api_url.as_deref(), loaded.config, args.quiet)?
        .with_platform(args.platform);
    debug!(api = ctx.api.base_url(), platform = ?ctx.platform, "extraction service selected");

    match args.command {
        Command::Detect { url, remote } => commands::run_detect(&ctx, &url, remote).await,
        Command::Info { url } => commands::run_info(&ctx, &url).await,
        Command::Formats { url, audio } => commands::run_formats(&ctx, &url, audio).await,
        Command::Download(download) => commands::run_download(&ctx, download).await,
        Command::Health => commands::run_health(&ctx).await,
    }
}
