//! Resolved runtime context shared by all subcommands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clipfetch_core::{
    ApiClient, DEFAULT_API_BASE_URL, DEFAULT_AUDIO_BITRATE_KBPS, DEFAULT_HEALTH_INTERVAL,
    HttpSettings, MediaReference, Platform, ValidationError,
};

use crate::app_config::{FileConfig, effective_api_url};

pub(crate) struct RunContext {
    pub(crate) api: ApiClient,
    pub(crate) config: FileConfig,
    pub(crate) quiet: bool,
    /// Chosen with `--platform`; detected from the URL when `None`.
    pub(crate) platform: Option<Platform>,
}

impl RunContext {
    pub(crate) fn new(api_url_flag: Option<&str>, config: FileConfig, quiet: bool) -> Result<Self> {
        let base_url = effective_api_url(api_url_flag, &config)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api = ApiClient::new(&base_url, http_settings(&config))
            .with_context(|| format!("Cannot use API base URL '{base_url}'"))?;
        Ok(Self {
            api,
            config,
            quiet,
            platform: None,
        })
    }

    pub(crate) fn with_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }

    /// Validates `url` for the chosen platform, or detects the platform.
    pub(crate) fn media_reference(&self, url: &str) -> Result<MediaReference, ValidationError> {
        match self.platform {
            Some(platform) => MediaReference::for_platform(url, platform),
            None => MediaReference::parse(url),
        }
    }

    pub(crate) fn output_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.config.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub(crate) fn audio_bitrate(&self, flag: Option<u32>) -> u32 {
        flag.or(self.config.audio_bitrate_kbps)
            .unwrap_or(DEFAULT_AUDIO_BITRATE_KBPS)
    }

    pub(crate) fn health_interval(&self) -> Duration {
        self.config
            .health_interval_secs
            .map_or(DEFAULT_HEALTH_INTERVAL, Duration::from_secs)
    }
}

fn http_settings(config: &FileConfig) -> HttpSettings {
    let defaults = HttpSettings::default();
    HttpSettings {
        connect_timeout_secs: config
            .connect_timeout_secs
            .unwrap_or(defaults.connect_timeout_secs),
        read_timeout_secs: config.read_timeout_secs.unwrap_or(defaults.read_timeout_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_defaults() {
        let config = FileConfig {
            output_dir: Some(PathBuf::from("/from/config")),
            audio_bitrate_kbps: Some(256),
            ..FileConfig::default()
        };
        let ctx = RunContext::new(Some("http://127.0.0.1:9/api"), config, false).unwrap();

        assert_eq!(ctx.output_dir(None), PathBuf::from("/from/config"));
        assert_eq!(ctx.output_dir(Some(PathBuf::from("out"))), PathBuf::from("out"));
        assert_eq!(ctx.audio_bitrate(None), 256);
        assert_eq!(ctx.audio_bitrate(Some(320)), 320);
    }

    #[test]
    fn test_unset_values_fall_back_to_builtin_defaults() {
        let ctx = RunContext::new(Some("http://127.0.0.1:9/api/"), FileConfig::default(), true).unwrap();
        assert_eq!(ctx.api.base_url(), "http://127.0.0.1:9/api");
        assert_eq!(ctx.output_dir(None), PathBuf::from("."));
        assert_eq!(ctx.audio_bitrate(None), DEFAULT_AUDIO_BITRATE_KBPS);
        assert_eq!(ctx.health_interval(), DEFAULT_HEALTH_INTERVAL);
    }

    #[test]
    fn test_config_timeouts_feed_http_settings() {
        let config = FileConfig {
            connect_timeout_secs: Some(3),
            ..FileConfig::default()
        };
        let settings = http_settings(&config);
        assert_eq!(settings.connect_timeout_secs, 3);
        assert_eq!(settings.read_timeout_secs, HttpSettings::default().read_timeout_secs);
    }

    #[test]
    fn test_chosen_platform_overrides_detection() {
        let ctx = RunContext::new(Some("http://127.0.0.1:9/api"), FileConfig::default(), false)
            .unwrap();
        assert!(ctx.media_reference("https://cdn.example.com/clip.mp4").is_err());

        let ctx = ctx.with_platform(Some(Platform::Direct));
        let reference = ctx.media_reference("https://cdn.example.com/clip.mp4").unwrap();
        assert_eq!(reference.platform(), Platform::Direct);

        let ctx = ctx.with_platform(Some(Platform::TikTok));
        assert!(ctx.media_reference("https://youtu.be/abc").is_err());
    }

    #[test]
    fn test_invalid_base_url_is_reported() {
        let err = RunContext::new(Some("ftp://nope"), FileConfig::default(), false)
            .err()
            .unwrap();
        assert!(err.to_string().contains("ftp://nope"));
    }
}
