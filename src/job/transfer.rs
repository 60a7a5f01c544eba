//! Artifact transfer: saving a finished job's output locally.

use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

/// A finished artifact ready to be retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub job_id: String,
    /// Server-provided file name.
    pub filename: String,
    /// Same-origin retrieval URL.
    pub url: String,
}

/// Errors while saving an artifact.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("network error retrieving {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} retrieving {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The host's "save this artifact" capability.
///
/// Invoked at most once per job.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Saves `artifact`; returns the local path when something was written.
    async fn save(&self, artifact: &Artifact) -> Result<Option<PathBuf>, TransferError>;
}

/// Streams artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    client: Client,
    output_dir: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(client: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, artifact: &Artifact) -> Result<Option<PathBuf>, TransferError> {
        let response = self
            .client
            .get(&artifact.url)
            .send()
            .await
            .map_err(|source| TransferError::Network {
                url: artifact.url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::HttpStatus {
                url: artifact.url.clone(),
                status: status.as_u16(),
            });
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| TransferError::io(&self.output_dir, e))?;
        let path = resolve_unique_path(&self.output_dir, &artifact.filename);
        let mut partial = PartialFile::new(partial_path(&path));
        debug!(path = %partial.path.display(), "writing artifact");

        let mut file = File::create(&partial.path)
            .await
            .map_err(|e| TransferError::io(&partial.path, e))?;
        let bytes = stream_to_file(&mut file, response, &artifact.url, &partial.path).await?;
        drop(file);

        tokio::fs::rename(&partial.path, &path)
            .await
            .map_err(|e| TransferError::io(&path, e))?;
        partial.keep();
        info!(path = %path.display(), bytes, "artifact saved");
        Ok(Some(path))
    }
}

/// A file being written; removed on drop unless kept.
///
/// Covers both error returns and a save future dropped mid-stream.
struct PartialFile {
    path: PathBuf,
    kept: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, kept: false }
    }

    fn keep(&mut self) {
        self.kept = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.kept {
            debug!(path = %self.path.display(), "removing partial artifact");
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// `clip.mp4` is written as `clip.mp4.part` until complete.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, TransferError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| TransferError::Network {
            url: url.to_string(),
            source,
        })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| TransferError::io(path, e))?;
        written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| TransferError::io(path, e))?;
    Ok(written)
}

/// Records artifacts without retrieving them, for hosts that save later.
#[derive(Debug, Default)]
pub struct RecordingSink {
    saved: Mutex<Vec<Artifact>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every artifact received so far, in order.
    #[must_use]
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn save(&self, artifact: &Artifact) -> Result<Option<PathBuf>, TransferError> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact.clone());
        Ok(None)
    }
}

/// Replaces characters that are invalid in file names on common systems.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim_matches(['_', '.']).is_empty() {
        return "download.bin".to_string();
    }
    if is_plain_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_plain_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// First free path for `filename` in `dir`: `clip.mp4`, `clip_1.mp4`, ...
pub(crate) fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let filename = sanitize_filename(filename);
    let candidate = dir.join(&filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => filename.split_at(pos),
        _ => (filename.as_str(), ""),
    };
    for i in 1..1000 {
        let candidate = dir.join(format!("{stem}_{i}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}
