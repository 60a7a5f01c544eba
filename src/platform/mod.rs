//! Source platform classification for user-supplied media URLs.
//!
//! [`classify`] is a pure predicate: it applies each platform's ordered
//! patterns and returns the first platform that matches. A
//! [`MediaReference`] can only be built from a classified URL, or explicitly
//! as a [`Platform::Direct`] link.
//!
//! # Example
//!
//! ```
//! use clipfetch_core::platform::{Platform, classify};
//!
//! assert_eq!(classify("https://youtu.be/abc"), Some(Platform::YouTube));
//! assert_eq!(classify("   "), None);
//! ```

mod patterns;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;
use url::Url;

/// Maximum URL length accepted before any pattern is evaluated.
pub const MAX_URL_LENGTH: usize = 2000;

/// Platforms the remote extraction service knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// youtube.com, youtu.be, music.youtube.com
    YouTube,
    /// facebook.com, fb.watch
    Facebook,
    /// twitter.com, x.com, t.co
    Twitter,
    /// instagram.com
    Instagram,
    /// tiktok.com
    TikTok,
    /// Any other http(s) media link.
    Direct,
}

impl Platform {
    /// Platforms tried by [`classify`], in order.
    pub const CLASSIFIED: [Platform; 5] = [
        Platform::YouTube,
        Platform::Facebook,
        Platform::Twitter,
        Platform::Instagram,
        Platform::TikTok,
    ];

    /// Stable lowercase identifier, as used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::TikTok => "tiktok",
            Self::Direct => "direct",
        }
    }

    /// Human-readable platform name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Facebook => "Facebook",
            Self::Twitter => "X (Twitter)",
            Self::Instagram => "Instagram",
            Self::TikTok => "TikTok",
            Self::Direct => "Direct URL",
        }
    }

    /// Returns true if `input` matches one of this platform's patterns.
    #[must_use]
    pub fn matches(self, input: &str) -> bool {
        patterns::patterns_for(self)
            .iter()
            .any(|pattern| pattern.is_match(input))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(Self::YouTube),
            "facebook" => Ok(Self::Facebook),
            "twitter" | "x" => Ok(Self::Twitter),
            "instagram" => Ok(Self::Instagram),
            "tiktok" => Ok(Self::TikTok),
            "direct" => Ok(Self::Direct),
            other => Err(ValidationError::unknown_platform(other)),
        }
    }
}

/// Local input validation failures. These never reach the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Input was empty or whitespace only.
    #[error("please enter a video URL")]
    EmptyUrl,

    /// Input did not match any supported platform.
    #[error("unsupported URL '{url}'\n  Suggestion: {suggestion}")]
    UnsupportedUrl {
        /// The rejected input.
        url: String,
        /// How to fix the issue.
        suggestion: &'static str,
    },

    /// A direct link was not an absolute http(s) URL.
    #[error("invalid direct URL '{url}': {reason}")]
    InvalidDirectUrl {
        /// The rejected input.
        url: String,
        /// Why the URL was rejected.
        reason: String,
    },

    /// A platform name could not be recognized.
    #[error("unknown platform '{name}'")]
    UnknownPlatform {
        /// The unrecognized name.
        name: String,
    },
}

impl ValidationError {
    /// Creates an `UnsupportedUrl` error.
    #[must_use]
    pub fn unsupported(url: &str) -> Self {
        Self::UnsupportedUrl {
            url: url.to_string(),
            suggestion: "Use a YouTube, Facebook, X (Twitter), Instagram or TikTok video link",
        }
    }

    /// Creates an `InvalidDirectUrl` error.
    #[must_use]
    pub fn invalid_direct(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDirectUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an `UnknownPlatform` error.
    #[must_use]
    pub fn unknown_platform(name: &str) -> Self {
        Self::UnknownPlatform {
            name: name.to_string(),
        }
    }
}

/// Classifies `input` as belonging to a supported platform.
///
/// Whitespace-only input is rejected without evaluating any pattern.
#[must_use]
pub fn classify(input: &str) -> Option<Platform> {
    let candidate = input.trim();
    if candidate.is_empty() || candidate.len() > MAX_URL_LENGTH {
        return None;
    }

    let platform = Platform::CLASSIFIED
        .into_iter()
        .find(|platform| platform.matches(candidate));
    trace!(url = candidate, ?platform, "classified URL");
    platform
}

/// A validated media URL bound to its source platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    url: String,
    platform: Platform,
}

impl MediaReference {
    /// Validates `input` and binds it to the first matching platform.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyUrl`] for blank input and
    /// [`ValidationError::UnsupportedUrl`] when no platform matches.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        let platform = classify(trimmed).ok_or_else(|| ValidationError::unsupported(trimmed))?;
        Ok(Self {
            url: trimmed.to_string(),
            platform,
        })
    }

    /// Validates `input` for an explicitly chosen platform.
    ///
    /// `Platform::Direct` accepts any absolute http(s) URL; every other
    /// platform requires its own patterns to match.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the input does not fit `platform`.
    pub fn for_platform(input: &str, platform: Platform) -> Result<Self, ValidationError> {
        if platform == Platform::Direct {
            return Self::direct(input);
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        if !platform.matches(trimmed) {
            return Err(ValidationError::unsupported(trimmed));
        }
        Ok(Self {
            url: trimmed.to_string(),
            platform,
        })
    }

    /// Builds a [`Platform::Direct`] reference.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDirectUrl`] unless the input is an
    /// absolute http or https URL with a host.
    pub fn direct(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        if trimmed.len() > MAX_URL_LENGTH {
            let preview: String = trimmed.chars().take(64).collect();
            return Err(ValidationError::invalid_direct(
                &preview,
                format!("URL exceeds {MAX_URL_LENGTH} characters"),
            ));
        }
        let parsed =
            Url::parse(trimmed).map_err(|e| ValidationError::invalid_direct(trimmed, e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ValidationError::invalid_direct(
                    trimmed,
                    format!("scheme '{scheme}' is not supported"),
                ));
            }
        }
        if parsed.host().is_none() {
            return Err(ValidationError::invalid_direct(trimmed, "URL has no host"));
        }
        Ok(Self {
            url: trimmed.to_string(),
            platform: Platform::Direct,
        })
    }

    /// The validated URL (trimmed, otherwise as entered).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The platform this URL belongs to.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.platform)
    }
}
