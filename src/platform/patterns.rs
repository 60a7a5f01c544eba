//! Ordered URL patterns per supported platform.

use std::sync::LazyLock;

use regex::Regex;

use super::Platform;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| Regex::new(&format!("(?i){pattern}")).ok())
        .collect()
}

static YOUTUBE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:^|[/.])youtube\.com/watch\?",
        r"(?:^|[/.])youtube\.com/(?:shorts|live|embed|v)/[\w-]+",
        r"(?:^|[/.])youtube\.com/playlist\?",
        r"(?:^|[/.])youtu\.be/[\w-]+",
        r"(?:^|[/.])music\.youtube\.com/watch\?",
    ])
});

static FACEBOOK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"facebook\.com/.*/videos/",
        r"facebook\.com/watch",
        r"facebook\.com/reel",
        r"fb\.watch/",
        r"facebook\.com/.*/posts/",
        r"facebook\.com/share/v/",
        r"facebook\.com/share/r/",
        r"facebook\.com/share/",
        r"facebook\.com/.*video\.php",
        r"facebook\.com/stories/",
        r"facebook\.com/.*/reels/",
    ])
});

static TWITTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:^|[/.])(?:twitter|x)\.com/\w+/status/\d+",
        r"(?:^|[/.])(?:mobile\.)?twitter\.com/\w+/status/\d+",
        r"(?:^|[/.])(?:mobile\.)?x\.com/\w+/status/\d+",
        r"^(?:https?://)?t\.co/\w+",
    ])
});

static INSTAGRAM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:^|[/.])instagram\.com/(?:p|reel|reels|tv)/[\w-]+",
        r"(?:^|[/.])instagram\.com/stories/[\w.]+/\d+",
        r"(?:^|[/.])instagr\.am/p/[\w-]+",
    ])
});

static TIKTOK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:^|[/.])tiktok\.com/@[\w.-]+/video/\d+",
        r"(?:^|[/.])(?:vm|vt)\.tiktok\.com/\w+",
        r"(?:^|[/.])tiktok\.com/t/\w+",
    ])
});

/// Returns the ordered patterns for `platform`.
///
/// `Platform::Direct` has no patterns; it is chosen explicitly by callers.
pub(super) fn patterns_for(platform: Platform) -> &'static [Regex] {
    match platform {
        Platform::YouTube => YOUTUBE_PATTERNS.as_slice(),
        Platform::Facebook => FACEBOOK_PATTERNS.as_slice(),
        Platform::Twitter => TWITTER_PATTERNS.as_slice(),
        Platform::Instagram => INSTAGRAM_PATTERNS.as_slice(),
        Platform::TikTok => TIKTOK_PATTERNS.as_slice(),
        Platform::Direct => &[],
    }
}
