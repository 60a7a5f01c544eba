//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use clipfetch_core::Platform;

/// Resolve, select and download media renditions.
///
/// Clipfetch talks to a running extraction service: it looks up a video's
/// metadata and formats, submits a download job and follows its progress
/// until the finished file is saved locally.
#[derive(Parser, Debug)]
#[command(name = "clipfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base URL of the extraction service (overrides config and CLIPFETCH_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Use this platform instead of detecting it from the URL
    /// (youtube, facebook, twitter, instagram, tiktok or direct for any http(s) link)
    #[arg(long, global = true, value_name = "NAME", value_parser = parse_platform)]
    pub platform: Option<Platform>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the platform a URL belongs to
    Detect {
        url: String,

        /// Ask the service when no local pattern matches
        #[arg(long)]
        remote: bool,
    },

    /// Show metadata and available formats
    Info { url: String },

    /// List the formats offered for one axis
    Formats {
        url: String,

        /// List audio-only formats instead of video
        #[arg(long)]
        audio: bool,
    },

    /// Download a rendition and save it locally
    Download(DownloadArgs),

    /// Show service health warnings
    Health,
}

#[derive(ClapArgs, Debug)]
pub struct DownloadArgs {
    pub url: String,

    /// Format id to download (defaults to the first offered format)
    #[arg(short, long, value_name = "ID")]
    pub format: Option<String>,

    /// Choose from audio-only formats
    #[arg(long)]
    pub audio: bool,

    /// Convert an audio-only format to mp3
    #[arg(long)]
    pub mp3: bool,

    /// mp3 bitrate in kbps (128, 192, 256 or 320)
    #[arg(long, value_name = "KBPS", value_parser = parse_bitrate)]
    pub bitrate: Option<u32>,

    /// Do not merge video-only formats with the best audio track
    #[arg(long)]
    pub no_merge: bool,

    /// Directory to save the artifact in
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    value.parse().map_err(|error: clipfetch_core::ValidationError| error.to_string())
}

fn parse_bitrate(value: &str) -> Result<u32, String> {
    let kbps: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if clipfetch_core::is_supported_bitrate(kbps) {
        Ok(kbps)
    } else {
        Err(format!("{kbps} is not one of 128, 192, 256, 320"))
    }
}
