//! Human-readable labels for metadata and formats.

use crate::model::RenditionFormat;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// `m:ss`, or `h:mm:ss` from one hour up.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Size with one decimal in the largest fitting unit (`B` to `GB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes.filter(|b| *b > 0) else {
        return "Unknown size".to_string();
    };
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", SIZE_UNITS[unit])
}

/// Compact count: `950`, `1.2K`, `3.4M`, `1.0B`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_count(count: u64) -> String {
    let value = count as f64;
    if count >= 1_000_000_000 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if count >= 1_000_000 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        count.to_string()
    }
}

/// `AUDIO_QUALITY_MEDIUM` -> `Audio Quality Medium`.
#[must_use]
pub fn quality_label(raw: &str) -> String {
    raw.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Best available description of an audio rendition.
#[must_use]
pub fn audio_label(format: &RenditionFormat) -> String {
    if let Some(audio_quality) = &format.audio_quality {
        return quality_label(audio_quality);
    }
    if let Some(kbps) = format.audio_bitrate_kbps {
        return format!("{kbps}kbps");
    }
    if !format.quality.is_empty() {
        return quality_label(&format.quality);
    }
    "Audio".to_string()
}

/// Track composition of a rendition.
#[must_use]
pub fn kind_label(format: &RenditionFormat) -> &'static str {
    match (format.has_video, format.has_audio) {
        (true, true) => "Video + Audio",
        (true, false) => "Video Only",
        (false, _) => "Audio Only",
    }
}
