//! Typed client for the remote extraction service.
//!
//! The service is treated as an opaque HTTP API plus a server-sent-events
//! progress channel. This module owns every wire detail: routes per
//! platform, JSON shapes, status-code classification and event-stream
//! decoding. Callers only see canonical model types and [`ApiError`].
//!
//! # Example
//!
//! ```no_run
//! use clipfetch_core::api::{ApiClient, HttpSettings};
//! use clipfetch_core::platform::MediaReference;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new("http://127.0.0.1:5000/api", HttpSettings::default())?;
//! let reference = MediaReference::parse("https://youtu.be/abc")?;
//! let (metadata, _inline_formats) = api.fetch_metadata(&reference).await?;
//! println!("{}", metadata.title);
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
mod routes;
mod sse;
mod wire;

pub use error::{ApiError, RequestPhase};
pub use http_client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpSettings};
pub use routes::PlatformRoutes;
pub use sse::{ChannelError, ProgressStream, decode_event_stream};
pub use wire::{ProgressEvent, ProgressStatus, StartJobRequest};

use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::model::{FormatList, MediaMetadata};
use crate::platform::{MediaReference, Platform};

use http_client::{ClientRole, build_api_client};
use wire::{
    DetectPlatformDto, ErrorBody, FormatsDto, HealthDto, MediaInfoDto, StartJobResponse,
    UrlRequest,
};

/// Default base URL of the extraction service.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api";

const HEALTH_ROUTE: &str = "/health";
const DETECT_PLATFORM_ROUTE: &str = "/detect-platform";
const PROGRESS_ROUTE: &str = "/download-progress";
const ARTIFACT_ROUTE: &str = "/download-file";

/// Raw health report, before warnings are derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    /// `Some(message)` when cookies are invalid or expiring soon.
    pub cookie_problem: Option<String>,
    /// `Some(message)` when the backend reports insufficient disk space.
    pub disk_problem: Option<String>,
}

const DEFAULT_COOKIE_MESSAGE: &str = "Cookies not configured. Some videos may be restricted.";
const DEFAULT_DISK_MESSAGE: &str = "Server disk space is running low.";

/// HTTP client bound to one extraction-service base URL.
///
/// Cheap to clone; the inner clients share their connection pools.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    stream_client: Client,
    transfer_client: Client,
}

impl ApiClient {
    /// Creates a client for `base_url` (for example `http://host:5000/api`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] for a non-http(s) or unparseable
    /// base, and [`ApiError::ClientBuild`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, settings: HttpSettings) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|e| ApiError::invalid_base_url(trimmed, e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::invalid_base_url(
                trimmed,
                "scheme must be http or https",
            ));
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            client: build_api_client(settings, ClientRole::Request)?,
            stream_client: build_api_client(settings, ClientRole::Stream)?,
            transfer_client: build_api_client(settings, ClientRole::Transfer)?,
        })
    }

    /// The normalized base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying request client for JSON calls.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Client for artifact bodies: no total deadline, only an idle timeout
    /// between reads.
    #[must_use]
    pub fn transfer_http(&self) -> &Client {
        &self.transfer_client
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    /// Runs the metadata phase for `reference`.
    ///
    /// Single-call platforms return their formats inline; two-phase platforms
    /// return `None` and need [`ApiClient::fetch_formats`].
    ///
    /// # Errors
    ///
    /// See [`ApiError::from_status`] for status mapping; transport failures
    /// are [`ApiError::Network`].
    #[instrument(skip(self), fields(url = reference.url(), platform = %reference.platform()))]
    pub async fn fetch_metadata(
        &self,
        reference: &MediaReference,
    ) -> Result<(MediaMetadata, Option<FormatList>), ApiError> {
        let routes = PlatformRoutes::for_platform(reference.platform());
        let dto: MediaInfoDto = self
            .post_json(
                routes.metadata,
                &UrlRequest {
                    url: reference.url(),
                },
                RequestPhase::Lookup,
            )
            .await?;
        let (metadata, inline_formats) = dto.into_parts(reference.platform());
        if routes.is_two_phase() {
            // Formats on a metadata-only response are not authoritative.
            return Ok((metadata, None));
        }
        Ok((metadata, Some(inline_formats.unwrap_or_default())))
    }

    /// Runs the format phase for `reference`.
    ///
    /// Single-call platforms re-issue their info call and keep only formats.
    ///
    /// # Errors
    ///
    /// Same classification as [`ApiClient::fetch_metadata`].
    #[instrument(skip(self), fields(url = reference.url(), platform = %reference.platform()))]
    pub async fn fetch_formats(&self, reference: &MediaReference) -> Result<FormatList, ApiError> {
        let routes = PlatformRoutes::for_platform(reference.platform());
        let body = UrlRequest {
            url: reference.url(),
        };
        match routes.formats {
            Some(route) => {
                let dto: FormatsDto = self.post_json(route, &body, RequestPhase::Lookup).await?;
                Ok(dto.into_format_list())
            }
            None => {
                let dto: MediaInfoDto = self
                    .post_json(routes.metadata, &body, RequestPhase::Lookup)
                    .await?;
                Ok(dto.into_parts(reference.platform()).1.unwrap_or_default())
            }
        }
    }

    /// Creates a download job and returns its id.
    ///
    /// # Errors
    ///
    /// 507 is [`ApiError::InsufficientStorage`], 404 is
    /// [`ApiError::UnsupportedOperation`]; a success body without
    /// `downloadId` is [`ApiError::InvalidResponse`].
    #[instrument(skip(self, request), fields(platform = %platform, format_id = %request.format_id))]
    pub async fn start_job(
        &self,
        platform: Platform,
        request: &StartJobRequest,
    ) -> Result<String, ApiError> {
        let route = PlatformRoutes::for_platform(platform).download_start;
        let response: StartJobResponse = self
            .post_json(route, request, RequestPhase::Submission)
            .await?;
        response
            .download_id
            .ok_or_else(|| ApiError::invalid_response(route, "response has no downloadId"))
    }

    /// Opens the progress channel for `job_id`.
    ///
    /// Resolves once response headers arrive; events are then read lazily
    /// from the returned stream. Dropping the stream closes the connection.
    ///
    /// # Errors
    ///
    /// Non-2xx responses are classified like any other call.
    #[instrument(skip(self))]
    pub async fn open_progress_stream(&self, job_id: &str) -> Result<ProgressStream, ApiError> {
        let route = format!("{PROGRESS_ROUTE}/{}", urlencoding::encode(job_id));
        let response = self
            .stream_client
            .get(self.endpoint(&route))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| ApiError::network(&route, e))?;
        let response = ensure_success(&route, response, RequestPhase::Service).await?;
        debug!(job_id, "progress channel opened");
        Ok(decode_event_stream(response.bytes_stream()))
    }

    /// Same-origin URL from which the finished artifact is retrieved.
    #[must_use]
    pub fn artifact_url(&self, job_id: &str, filename: &str) -> String {
        format!(
            "{}{ARTIFACT_ROUTE}/{}?filename={}",
            self.base_url,
            urlencoding::encode(job_id),
            urlencoding::encode(filename)
        )
    }

    /// Polls the health endpoint once.
    ///
    /// # Errors
    ///
    /// Any failure is returned; callers decide whether it matters.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthReport, ApiError> {
        let response = self
            .client
            .get(self.endpoint(HEALTH_ROUTE))
            .send()
            .await
            .map_err(|e| ApiError::network(HEALTH_ROUTE, e))?;
        let response = ensure_success(HEALTH_ROUTE, response, RequestPhase::Service).await?;
        let dto: HealthDto = decode_json(HEALTH_ROUTE, response).await?;

        let cookie_problem = dto
            .cookie_status
            .filter(|status| !status.valid || status.expiring_soon)
            .map(|status| {
                status
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_COOKIE_MESSAGE.to_string())
            });
        let disk_problem = dto
            .disk_space
            .filter(|disk| !disk.sufficient)
            .map(|disk| {
                disk.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DISK_MESSAGE.to_string())
            });

        Ok(HealthReport {
            cookie_problem,
            disk_problem,
        })
    }

    /// Asks the service which platform `url` belongs to.
    ///
    /// Returns `Ok(None)` when the service answers `unknown` or names a
    /// platform this client does not support.
    ///
    /// # Errors
    ///
    /// Transport and status failures.
    #[instrument(skip(self))]
    pub async fn detect_platform(&self, url: &str) -> Result<Option<Platform>, ApiError> {
        let dto: DetectPlatformDto = self
            .post_json(DETECT_PLATFORM_ROUTE, &UrlRequest { url }, RequestPhase::Service)
            .await?;
        Ok(dto
            .platform
            .filter(|name| name != "unknown")
            .and_then(|name| name.parse().ok()))
    }

    async fn post_json<B, R>(&self, route: &str, body: &B, phase: RequestPhase) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(route, "POST");
        let response = self
            .client
            .post(self.endpoint(route))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::network(route, e))?;
        let response = ensure_success(route, response, phase).await?;
        decode_json(route, response).await
    }
}

async fn ensure_success(
    route: &str,
    response: Response,
    phase: RequestPhase,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // The body is best-effort: a missing or non-JSON body just means no message.
    let server_message = response
        .bytes()
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
        .and_then(ErrorBody::into_message);
    debug!(route, status = status.as_u16(), ?server_message, "request rejected");
    Err(ApiError::from_status(route, status, server_message, phase))
}

async fn decode_json<R: DeserializeOwned>(route: &str, response: Response) -> Result<R, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::network(route, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::invalid_response(route, e.to_string()))
}
