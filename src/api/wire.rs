//! JSON shapes exchanged with the extraction service and their
//! normalization into the canonical model.
//!
//! The service is loose about types: counts and durations arrive as numbers
//! or numeric strings, and format ids as `formatId` or a numeric `itag`.
//! Everything is accepted here and tightened before leaving the module.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::{FormatList, MediaMetadata, RenditionFormat};
use crate::platform::Platform;

const UNTITLED: &str = "Untitled";

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<u64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            })
        }
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_to_u64))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_to_f64))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_to_string))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Body of the `error`/`message` envelope on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        non_empty(self.error).or_else(|| non_empty(self.message))
    }
}

/// Request body for lookup and detection calls.
#[derive(Debug, Serialize)]
pub(crate) struct UrlRequest<'a> {
    pub(crate) url: &'a str,
}

/// Response of the metadata (and single-call info) routes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MediaInfoDto {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    author_handle: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    duration: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    view_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    like_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    retweet_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    reply_count: Option<u64>,
    #[serde(default)]
    is_private: Option<bool>,
    #[serde(default)]
    is_gif: Option<bool>,
    #[serde(default)]
    formats: Option<Vec<FormatDto>>,
    #[serde(default, deserialize_with = "lenient_string")]
    best_audio_itag: Option<String>,
}

impl MediaInfoDto {
    /// Splits the response into canonical metadata and any inline formats.
    pub(crate) fn into_parts(self, platform: Platform) -> (MediaMetadata, Option<FormatList>) {
        let author = non_empty(self.author);
        let (author, author_handle) = if platform == Platform::Twitter {
            // Twitter's `author` is the @handle; `authorName` is the display name.
            let display = non_empty(self.author_name).or_else(|| author.clone());
            (display, author)
        } else {
            (
                author.or_else(|| non_empty(self.author_name)),
                non_empty(self.author_handle).or_else(|| non_empty(self.username)),
            )
        };

        let metadata = MediaMetadata {
            title: non_empty(self.title).unwrap_or_else(|| UNTITLED.to_string()),
            author: author.unwrap_or_default(),
            author_handle,
            thumbnail_url: non_empty(self.thumbnail).or_else(|| non_empty(self.thumbnail_url)),
            duration_seconds: self.duration.unwrap_or(0),
            view_count: self.view_count,
            like_count: self.like_count,
            retweet_count: self.retweet_count,
            reply_count: self.reply_count,
            is_private: self.is_private,
            is_gif: self.is_gif,
        };

        // Inline formats often omit track flags; those are muxed renditions.
        let formats = self.formats.map(|formats| FormatList {
            formats: normalize_formats(formats, true),
            preferred_audio_id: self.best_audio_itag,
        });

        (metadata, formats)
    }
}

/// Response of the dedicated formats route.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FormatsDto {
    #[serde(default)]
    formats: Vec<FormatDto>,
    #[serde(default, deserialize_with = "lenient_string")]
    best_audio_itag: Option<String>,
}

impl FormatsDto {
    pub(crate) fn into_format_list(self) -> FormatList {
        FormatList {
            formats: normalize_formats(self.formats, false),
            preferred_audio_id: self.best_audio_itag,
        }
    }
}

/// One rendition as the service reports it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FormatDto {
    #[serde(default, deserialize_with = "lenient_string")]
    format_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    itag: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    quality_label: Option<String>,
    #[serde(default)]
    container: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    has_video: Option<bool>,
    #[serde(default)]
    has_audio: Option<bool>,
    #[serde(default, deserialize_with = "lenient_u64")]
    filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    audio_bitrate: Option<u64>,
    #[serde(default)]
    audio_quality: Option<String>,
}

impl FormatDto {
    /// `muxed_when_untagged` marks a format that carries neither track flag
    /// as video plus audio.
    fn into_format(self, muxed_when_untagged: bool) -> Option<RenditionFormat> {
        let format_id = self.format_id.or(self.itag)?;
        let (has_video, has_audio) = match (self.has_video, self.has_audio) {
            (None, None) if muxed_when_untagged => (true, true),
            (video, audio) => (video.unwrap_or(false), audio.unwrap_or(false)),
        };
        Some(RenditionFormat {
            format_id,
            quality: non_empty(self.quality)
                .or_else(|| non_empty(self.quality_label))
                .unwrap_or_default(),
            container: non_empty(self.container)
                .or_else(|| non_empty(self.ext))
                .unwrap_or_default(),
            has_video,
            has_audio,
            filesize_bytes: self.filesize.filter(|size| *size > 0),
            audio_bitrate_kbps: self
                .audio_bitrate
                .and_then(|bitrate| u32::try_from(bitrate).ok()),
            audio_quality: non_empty(self.audio_quality),
        })
    }
}

fn normalize_formats(formats: Vec<FormatDto>, muxed_when_untagged: bool) -> Vec<RenditionFormat> {
    let total = formats.len();
    let normalized: Vec<RenditionFormat> = formats
        .into_iter()
        .filter_map(|format| format.into_format(muxed_when_untagged))
        .collect();
    if normalized.len() < total {
        debug!(
            dropped = total - normalized.len(),
            "dropped formats without formatId/itag"
        );
    }
    normalized
}

/// Job-creation request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    pub url: String,
    pub format_id: String,
    /// Legacy alias of `format_id` still read by the YouTube route.
    pub itag: String,
    pub quality: String,
    pub convert_to_mp3: bool,
    pub mp3_bitrate: u32,
    pub merge_audio: bool,
    pub estimated_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartJobResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) download_id: Option<String>,
}

/// Status carried by one progress-channel event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Processing,
    Completed,
    Error,
    /// Any status this client does not know; skipped by the coordinator.
    Other(String),
}

impl ProgressStatus {
    fn parse(raw: &str) -> Self {
        match raw {
            "downloading" => Self::Downloading,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One decoded progress-channel event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub progress: Option<f64>,
    pub stage: Option<String>,
    pub filename: Option<String>,
    pub message: Option<String>,
}

impl ProgressEvent {
    /// Decodes the JSON payload of one `data:` frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the payload is not an event object.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        let dto: ProgressEventDto = serde_json::from_str(payload)?;
        Ok(Self {
            status: ProgressStatus::parse(dto.status.trim()),
            progress: dto.progress,
            stage: non_empty(dto.stage),
            filename: non_empty(dto.filename),
            message: non_empty(dto.message),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProgressEventDto {
    status: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    progress: Option<f64>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HealthDto {
    #[serde(default)]
    pub(crate) cookie_status: Option<CookieStatusDto>,
    #[serde(default)]
    pub(crate) disk_space: Option<DiskSpaceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CookieStatusDto {
    #[serde(default = "default_true")]
    pub(crate) valid: bool,
    #[serde(default)]
    pub(crate) expiring_soon: bool,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiskSpaceDto {
    #[serde(default = "default_true")]
    pub(crate) sufficient: bool,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetectPlatformDto {
    #[serde(default)]
    pub(crate) platform: Option<String>,
}
