//! HTTP client construction policy for the extraction-service API.
//!
//! Three clients are built from one policy: a request client with a total
//! timeout for JSON calls, a streaming client with only a connect timeout for
//! the long-lived progress channel, and a transfer client for artifact bodies
//! whose timeout applies per read, so a large file that keeps arriving never
//! hits a deadline.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

use super::ApiError;

/// Default connect timeout for every call.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default total timeout for request/response calls, and the idle timeout
/// between reads of an artifact body.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Timeouts applied to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout for JSON calls and idle timeout for artifact reads, in
    /// seconds. Not applied to the progress stream.
    pub read_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClientRole {
    Request,
    Stream,
    Transfer,
}

/// Builds an API client for `role` using shared policy.
///
/// Some sandboxed environments panic while reading system proxy settings;
/// in that case the builder is retried with system lookup disabled and the
/// `*_PROXY` environment variables applied by hand.
pub(crate) fn build_api_client(settings: HttpSettings, role: ClientRole) -> Result<Client, ApiError> {
    match try_build_client(settings, role, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!(?role, "API client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(settings, role, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ApiError::ClientBuild {
                    reason: "client construction panicked while reading proxy settings".to_string(),
                }),
                Err(BuildClientFailure::Build(error)) => Err(ApiError::ClientBuild {
                    reason: error.to_string(),
                }),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(ApiError::ClientBuild {
            reason: error.to_string(),
        }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    settings: HttpSettings,
    role: ClientRole,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(settings, role);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(settings: HttpSettings, role: ClientRole) -> ClientBuilder {
    let builder = Client::builder()
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .user_agent(user_agent::default_api_user_agent());

    match role {
        ClientRole::Request => builder
            .timeout(Duration::from_secs(settings.read_timeout_secs))
            .gzip(true),
        // Compression would buffer event frames.
        ClientRole::Stream => builder.gzip(false),
        ClientRole::Transfer => builder
            .read_timeout(Duration::from_secs(settings.read_timeout_secs))
            .gzip(false),
    }
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
