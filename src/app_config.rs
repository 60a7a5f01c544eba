//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use clipfetch_core::is_supported_bitrate;

/// Environment variable overriding the configured API base URL.
pub const API_URL_ENV: &str = "CLIPFETCH_API_URL";

/// TOML-backed file configuration for clipfetch defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Base URL of the extraction service.
    pub api_base_url: Option<String>,
    /// Default directory for saved artifacts.
    pub output_dir: Option<PathBuf>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// Health polling interval used while a download runs.
    pub health_interval_secs: Option<u64>,
    /// Default audio conversion bitrate.
    pub audio_bitrate_kbps: Option<u32>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_range("connect_timeout_secs", self.connect_timeout_secs, 1..=3600)?;
        validate_range("read_timeout_secs", self.read_timeout_secs, 1..=3600)?;
        validate_range("health_interval_secs", self.health_interval_secs, 1..=86_400)?;

        if let Some(bitrate) = self.audio_bitrate_kbps
            && !is_supported_bitrate(bitrate)
        {
            bail!(
                "Invalid config value for `audio_bitrate_kbps`: {bitrate}. Expected one of: 128, 192, 256, 320"
            );
        }

        if let Some(url) = &self.api_base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            bail!("Invalid config value for `api_base_url`: '{url}'. Expected an http(s) URL");
        }

        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, range: std::ops::RangeInclusive<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !range.contains(&value) {
        bail!(
            "Invalid config value for `{field}`: {value}. Expected range: {}..={}",
            range.start(),
            range.end()
        );
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Log filter used when neither `RUST_LOG` nor a CLI flag decides.
    #[must_use]
    pub fn default_filter(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config; defaults when no file exists.
    pub config: FileConfig,
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/clipfetch/config.toml`
/// 2. `$HOME/.config/clipfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("clipfetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("clipfetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

/// API base URL after applying precedence: flag, then env, then file.
#[must_use]
pub fn effective_api_url(flag: Option<&str>, file: &FileConfig) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| {
            env::var(API_URL_ENV)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .or_else(|| file.api_base_url.clone())
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "api_base_url" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `api_base_url` value on line {line_no}"))?;
                cfg.api_base_url = Some(parsed);
            }
            "output_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `output_dir` value on line {line_no}"))?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `read_timeout_secs` value on line {line_no}"))?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "health_interval_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `health_interval_secs` value on line {line_no}")
                })?;
                cfg.health_interval_secs = Some(parsed);
            }
            "audio_bitrate_kbps" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `audio_bitrate_kbps` value on line {line_no}")
                })?;
                let kbps = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("audio_bitrate_kbps out of range for u32"))?;
                cfg.audio_bitrate_kbps = Some(kbps);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
api_base_url = "http://media.local:5000/api"
output_dir = "/tmp/clips"
connect_timeout_secs = 5
read_timeout_secs = 90
health_interval_secs = 600
audio_bitrate_kbps = 320
verbosity = "verbose"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.api_base_url.as_deref(), Some("http://media.local:5000/api"));
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/clips")));
        assert_eq!(cfg.connect_timeout_secs, Some(5));
        assert_eq!(cfg.read_timeout_secs, Some(90));
        assert_eq!(cfg.health_interval_secs, Some(600));
        assert_eq!(cfg.audio_bitrate_kbps, Some(320));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
# service
api_base_url = "http://host/api#frag" # trailing
read_timeout_secs = 30 # seconds
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.api_base_url.as_deref(), Some("http://host/api#frag"));
        assert_eq!(cfg.read_timeout_secs, Some(30));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_values() {
        let err = parse_config_str("connect_timeout_secs = 0").expect_err("0 is below range");
        assert!(err.to_string().contains("connect_timeout_secs"));

        let err = parse_config_str("health_interval_secs = 86401").expect_err("above range");
        assert!(err.to_string().contains("health_interval_secs"));

        let err = parse_config_str("audio_bitrate_kbps = 64").expect_err("unsupported bitrate");
        assert!(err.to_string().contains("audio_bitrate_kbps"));
    }

    #[test]
    fn test_parse_config_rejects_bad_syntax() {
        let err = parse_config_str("read_timeout_secs = 4 trailing").expect_err("trailing token");
        assert!(err.to_string().contains("read_timeout_secs"));

        let err = parse_config_str("api_base_url = http://x").expect_err("unquoted string");
        assert!(err.to_string().contains("api_base_url"));

        let err = parse_config_str("just words").expect_err("missing equals");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_non_http_api_url() {
        let err = parse_config_str(r#"api_base_url = "ftp://host/api""#).expect_err("scheme");
        assert!(err.to_string().contains("api_base_url"));
    }

    #[test]
    fn test_flag_beats_file_for_api_url() {
        let file = FileConfig {
            api_base_url: Some("http://file/api".to_string()),
            ..FileConfig::default()
        };
        assert_eq!(
            effective_api_url(Some("http://flag/api"), &file).as_deref(),
            Some("http://flag/api")
        );
    }

    #[test]
    fn test_verbosity_filters() {
        assert_eq!(VerbositySetting::Default.default_filter(), "info");
        assert_eq!(VerbositySetting::Quiet.default_filter(), "error");
        assert_eq!(VerbositySetting::Debug.default_filter(), "trace");
    }
}
