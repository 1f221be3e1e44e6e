//! Streaming artifact download.
//!
//! Response bodies are streamed chunk by chunk into a caller-provided path,
//! never buffered whole in memory. Callers own the staging file and decide
//! where it ends up; this module only moves bytes.

use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::errors::InstallerError;

/// Downloads `url` into `dest`, truncating it first. Returns the byte count.
///
/// # Errors
///
/// Returns [`InstallerError::Transfer`] if the request fails, the server
/// answers with a non-success status, or the file cannot be written.
pub async fn download_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, InstallerError> {
    log::debug!("downloading {url} -> {}", dest.display());

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| InstallerError::transfer_with_source(format!("failed to connect to {url}"), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(InstallerError::transfer(format!("HTTP {status} from {url}")));
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
        InstallerError::transfer_with_source(format!("failed to create {}", dest.display()), e)
    })?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            InstallerError::transfer_with_source(format!("failed to read body of {url}"), e)
        })?;
        file.write_all(&chunk).await.map_err(|e| {
            InstallerError::transfer_with_source(format!("failed to write {}", dest.display()), e)
        })?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| {
        InstallerError::transfer_with_source(format!("failed to flush {}", dest.display()), e)
    })?;

    log::info!("downloaded {downloaded} bytes from {url}");
    Ok(downloaded)
}
