//! Format catalog: narrows a raw rendition list into the entries offered
//! for one axis (video or audio).
//!
//! Everything here is a pure function of its input. Duplicates are judged by
//! `(quality, container)`; the first occurrence in source order wins.

pub mod display;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::model::RenditionFormat;

/// Maximum entries offered on the video axis.
pub const MAX_VIDEO_FORMATS: usize = 8;

/// Maximum entries offered on the audio axis.
pub const MAX_AUDIO_FORMATS: usize = 6;

/// Which kind of track the user is choosing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FormatAxis {
    #[default]
    Video,
    Audio,
}

impl FormatAxis {
    #[must_use]
    pub fn cap(self) -> usize {
        match self {
            Self::Video => MAX_VIDEO_FORMATS,
            Self::Audio => MAX_AUDIO_FORMATS,
        }
    }

    fn admits(self, format: &RenditionFormat) -> bool {
        match self {
            Self::Video => format.has_video,
            Self::Audio => format.is_audio_only(),
        }
    }

    fn dedup_key(self, format: &RenditionFormat) -> (String, String) {
        let quality = match self {
            Self::Video => format.quality.clone(),
            Self::Audio if !format.quality.is_empty() => format.quality.clone(),
            Self::Audio => format
                .audio_bitrate_kbps
                .map(|kbps| kbps.to_string())
                .unwrap_or_default(),
        };
        (quality, format.container.clone())
    }
}

impl fmt::Display for FormatAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Audio => "audio",
        })
    }
}

impl FromStr for FormatAxis {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            other => Err(format!("unknown format axis '{other}' (expected video or audio)")),
        }
    }
}

/// Filters, deduplicates and caps `formats` for `axis`.
///
/// Idempotent: filtering an already-filtered list returns it unchanged.
#[must_use]
pub fn filter(formats: &[RenditionFormat], axis: FormatAxis) -> Vec<RenditionFormat> {
    let mut seen = HashSet::new();
    formats
        .iter()
        .filter(|format| axis.admits(format))
        .filter(|format| seen.insert(axis.dedup_key(format)))
        .take(axis.cap())
        .cloned()
        .collect()
}

/// The entry preselected for `axis`: the first one offered.
#[must_use]
pub fn default_selection(formats: &[RenditionFormat], axis: FormatAxis) -> Option<RenditionFormat> {
    filter(formats, axis).into_iter().next()
}

/// Looks up a format by id across the whole list.
#[must_use]
pub fn find<'a>(formats: &'a [RenditionFormat], format_id: &str) -> Option<&'a RenditionFormat> {
    formats.iter().find(|format| format.format_id == format_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, quality: &str, container: &str) -> RenditionFormat {
        RenditionFormat {
            format_id: id.to_string(),
            quality: quality.to_string(),
            container: container.to_string(),
            has_video: true,
            has_audio: true,
            ..RenditionFormat::default()
        }
    }

    fn audio(id: &str, quality: &str, bitrate: Option<u32>, container: &str) -> RenditionFormat {
        RenditionFormat {
            format_id: id.to_string(),
            quality: quality.to_string(),
            container: container.to_string(),
            has_audio: true,
            audio_bitrate_kbps: bitrate,
            ..RenditionFormat::default()
        }
    }

    #[test]
    fn test_video_axis_dedups_keeping_first() {
        let formats = vec![
            video("22", "720p", "mp4"),
            video("136", "720p", "mp4"),
            video("247", "720p", "webm"),
            audio("140", "", Some(128), "m4a"),
        ];
        let filtered = filter(&formats, FormatAxis::Video);
        let ids: Vec<&str> = filtered.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, ["22", "247"]);
    }

    #[test]
    fn test_video_axis_includes_video_only() {
        let mut silent = video("137", "1080p", "mp4");
        silent.has_audio = false;
        assert_eq!(filter(&[silent], FormatAxis::Video).len(), 1);
    }

    #[test]
    fn test_audio_axis_excludes_muxed_and_keys_on_bitrate() {
        let formats = vec![
            video("18", "360p", "mp4"),
            audio("140", "", Some(128), "m4a"),
            audio("139", "", Some(48), "m4a"),
            audio("141", "", Some(128), "m4a"),
            audio("251", "AUDIO_QUALITY_MEDIUM", Some(160), "webm"),
        ];
        let ids: Vec<String> = filter(&formats, FormatAxis::Audio)
            .into_iter()
            .map(|f| f.format_id)
            .collect();
        assert_eq!(ids, ["140", "139", "251"]);
    }

    #[test]
    fn test_caps_hold_for_large_inputs() {
        let videos: Vec<RenditionFormat> = (0..40)
            .map(|i| video(&i.to_string(), &format!("{i}p"), "mp4"))
            .collect();
        assert_eq!(filter(&videos, FormatAxis::Video).len(), MAX_VIDEO_FORMATS);

        let audios: Vec<RenditionFormat> = (0..40)
            .map(|i| audio(&i.to_string(), "", Some(i), "m4a"))
            .collect();
        assert_eq!(filter(&audios, FormatAxis::Audio).len(), MAX_AUDIO_FORMATS);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let formats = vec![
            video("22", "720p", "mp4"),
            video("22b", "720p", "mp4"),
            video("18", "360p", "mp4"),
            audio("140", "", Some(128), "m4a"),
        ];
        for axis in [FormatAxis::Video, FormatAxis::Audio] {
            let once = filter(&formats, axis);
            assert_eq!(filter(&once, axis), once, "{axis}");
        }
    }

    #[test]
    fn test_default_selection_and_find() {
        let formats = vec![audio("140", "", Some(128), "m4a"), video("22", "720p", "mp4")];
        assert_eq!(
            default_selection(&formats, FormatAxis::Video).map(|f| f.format_id),
            Some("22".to_string())
        );
        assert!(default_selection(&[], FormatAxis::Audio).is_none());
        assert_eq!(find(&formats, "140").map(|f| f.container.as_str()), Some("m4a"));
        assert!(find(&formats, "999").is_none());
    }

    #[test]
    fn test_axis_parses_case_insensitively() {
        assert_eq!("Audio".parse::<FormatAxis>(), Ok(FormatAxis::Audio));
        assert!("both".parse::<FormatAxis>().is_err());
    }
}
