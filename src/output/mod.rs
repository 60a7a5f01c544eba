//! CLI output formatting and display helpers.

use clipfetch_core::catalog::display::{
    audio_label, format_count, format_duration, format_file_size, kind_label, quality_label,
};
use clipfetch_core::{FormatAxis, HealthStatus, MediaMetadata, Platform, RenditionFormat};

/// Shown when the service reports no warnings.
pub const HEALTH_OK: &str = "Service healthy: no warnings.";

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

/// Labelled metadata lines; optional counters are omitted when absent.
pub fn metadata_lines(metadata: &MediaMetadata, platform: Platform, width: usize) -> Vec<String> {
    let label_width = "Platform: ".len();
    let value_width = width.saturating_sub(label_width);
    let author = match metadata.author_handle.as_deref() {
        Some(handle) if !handle.is_empty() => format!("{} (@{handle})", metadata.author),
        _ => metadata.author.clone(),
    };

    let mut lines = vec![
        format!("Title:    {}", truncate_to_width(&metadata.title, value_width)),
        format!("Author:   {}", truncate_to_width(&author, value_width)),
        format!("Platform: {}", platform.display_name()),
        format!("Duration: {}", format_duration(metadata.duration_seconds)),
    ];
    let counters = [
        ("Views:   ", metadata.view_count),
        ("Likes:   ", metadata.like_count),
        ("Reposts: ", metadata.retweet_count),
        ("Replies: ", metadata.reply_count),
    ];
    for (label, value) in counters {
        if let Some(value) = value {
            lines.push(format!("{label} {}", format_count(value)));
        }
    }
    if metadata.is_private == Some(true) {
        lines.push("Private:  yes".to_string());
    }
    if metadata.is_gif == Some(true) {
        lines.push("GIF:      yes".to_string());
    }
    lines
}

/// Table rows for one format axis, header first.
pub fn format_table_lines(formats: &[RenditionFormat], axis: FormatAxis) -> Vec<String> {
    if formats.is_empty() {
        return vec![format!("No {axis} formats available.")];
    }
    let mut lines = vec![format!(
        "{:<12} {:<14} {:<9} {:<12} {}",
        "ID", "QUALITY", "EXT", "KIND", "SIZE"
    )];
    for format in formats {
        let quality = match axis {
            FormatAxis::Video => quality_label(&format.quality),
            FormatAxis::Audio => audio_label(format),
        };
        lines.push(format!(
            "{:<12} {:<14} {:<9} {:<12} {}",
            format.format_id,
            quality,
            format.container,
            kind_label(format),
            format_file_size(format.filesize_bytes)
        ));
    }
    lines
}

pub fn health_lines(status: &HealthStatus) -> Vec<String> {
    if !status.has_warnings() {
        return vec![HEALTH_OK.to_string()];
    }
    let mut lines = Vec::new();
    if let Some(warning) = &status.credential_warning {
        lines.push(format!("Warning: {warning}"));
    }
    if let Some(warning) = &status.disk_space_warning {
        lines.push(format!("Warning: {warning}"));
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> MediaMetadata {
        MediaMetadata {
            title: "Never Gonna Give You Up".to_string(),
            author: "Rick Astley".to_string(),
            duration_seconds: 213,
            view_count: Some(1_500_000),
            ..MediaMetadata::default()
        }
    }

    #[test]
    fn test_truncate_to_width_appends_ellipsis() {
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abc", 4), "abc");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_metadata_lines_skip_absent_counters() {
        let lines = metadata_lines(&sample_metadata(), Platform::YouTube, 80);
        assert_eq!(lines[0], "Title:    Never Gonna Give You Up");
        assert_eq!(lines[2], "Platform: YouTube");
        assert_eq!(lines[3], "Duration: 3:33");
        assert!(lines.iter().any(|line| line.starts_with("Views:")));
        assert!(!lines.iter().any(|line| line.starts_with("Likes:")));
    }

    #[test]
    fn test_metadata_lines_show_author_handle() {
        let metadata = MediaMetadata {
            author_handle: Some("rick".to_string()),
            ..sample_metadata()
        };
        let lines = metadata_lines(&metadata, Platform::Twitter, 80);
        assert_eq!(lines[1], "Author:   Rick Astley (@rick)");
    }

    #[test]
    fn test_format_table_lists_rows_under_header() {
        let formats = vec![RenditionFormat {
            format_id: "137".to_string(),
            quality: "1080p".to_string(),
            container: "mp4".to_string(),
            has_video: true,
            filesize_bytes: Some(1024),
            ..RenditionFormat::default()
        }];
        let lines = format_table_lines(&formats, FormatAxis::Video);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("137"));
        assert!(lines[1].ends_with("1.0 KB"));
    }

    #[test]
    fn test_format_table_empty_axis_message() {
        assert_eq!(
            format_table_lines(&[], FormatAxis::Audio),
            vec!["No audio formats available.".to_string()]
        );
    }

    #[test]
    fn test_health_lines() {
        assert_eq!(health_lines(&HealthStatus::default()), vec![HEALTH_OK.to_string()]);
        let status = HealthStatus {
            credential_warning: Some("Cookies expire soon".to_string()),
            disk_space_warning: None,
        };
        assert_eq!(health_lines(&status), vec!["Warning: Cookies expire soon".to_string()]);
    }
}
