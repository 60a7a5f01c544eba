//! Shared User-Agent string for calls against the extraction service.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/clipfetch";

/// Default User-Agent for API, progress-stream and artifact requests.
#[must_use]
pub(crate) fn default_api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("clipfetch/{version} (+{PROJECT_UA_URL})")
}
