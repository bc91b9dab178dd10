use std::{
    io,
    path::{Path, PathBuf},
};

use futures_util::StreamExt;
use gdrive_core::{DriveClient, DriveError};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("drive client error: {0}")]
    Drive(#[from] DriveError),
    #[error("download returned {status}")]
    Status { status: StatusCode },
}

/// What to do when a download answers with anything but `200 OK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Fail the download; nothing is written.
    #[default]
    Reject,
    /// Leave an empty file at the target and report success.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    /// No file id was resolved, so nothing was fetched.
    Skipped,
    Written { bytes: u64 },
    /// Non-OK response accepted under [`StatusPolicy::Lenient`].
    Empty { status: StatusCode },
}

#[allow(async_fn_in_trait)]
pub trait FileMaterializer {
    /// Fetches `file_id` into `target`. An empty id is a successful no-op.
    async fn materialize(&self, target: &Path, file_id: &str)
    -> Result<Materialized, TransferError>;
}

#[derive(Clone)]
pub struct TransferClient {
    drive: DriveClient,
    http: Client,
    policy: StatusPolicy,
}

impl TransferClient {
    pub fn new(drive: DriveClient) -> Self {
        Self::with_http(drive, Client::new())
    }

    pub fn with_http(drive: DriveClient, http: Client) -> Self {
        Self {
            drive,
            http,
            policy: StatusPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn download_to_path(
        &self,
        file_id: &str,
        target: &Path,
    ) -> Result<Materialized, TransferError> {
        let url = self.drive.media_url(file_id)?;
        info!(file_id, target = %target.display(), "downloading archive");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            if self.policy == StatusPolicy::Reject {
                return Err(TransferError::Status { status });
            }
            warn!(file_id, %status, target = %target.display(), "download not OK, leaving empty file");
            create_parent(target).await?;
            tokio::fs::File::create(target).await?;
            return Ok(Materialized::Empty { status });
        }

        create_parent(target).await?;
        let partial = partial_path(target);
        match write_partial(response, &partial, target).await {
            Ok(bytes) => Ok(Materialized::Written { bytes }),
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(err)
            }
        }
    }
}

/// Streams the body into `partial` and renames it over `target`.
async fn write_partial(
    response: reqwest::Response,
    partial: &Path,
    target: &Path,
) -> Result<u64, TransferError> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut bytes = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        bytes += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(partial, target).await?;
    Ok(bytes)
}

impl FileMaterializer for TransferClient {
    async fn materialize(
        &self,
        target: &Path,
        file_id: &str,
    ) -> Result<Materialized, TransferError> {
        if file_id.is_empty() {
            return Ok(Materialized::Skipped);
        }
        self.download_to_path(file_id, target).await
    }
}

async fn create_parent(target: &Path) -> io::Result<()> {
    match target.parent() {
        Some(parent) => tokio::fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}

fn partial_path(target: &Path) -> PathBuf {
    target.with_extension(format!(
        "{}partial",
        target
            .extension()
            .map(|ext| format!("{}.", ext.to_string_lossy()))
            .unwrap_or_default()
    ))
}
