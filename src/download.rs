use crate::error::ClientError;
use crate::hash::ContentHash;
use crate::provider::{FileMetadata, StorageProvider};
use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::{remove_file, rename, File};
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;
use tracing::{error, instrument, trace};

/// Sibling file the content is streamed into before it replaces `local`.
fn partial_path(local: &Path) -> PathBuf {
    let mut name = local
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    local.with_file_name(name)
}

/// Downloads `remote` (optionally at revision `rev`) into `local`.
///
/// The received content is checked against the size and content hash the
/// server reports before it replaces `local`. On failure the partial file is
/// removed and an existing `local` is left untouched.
#[instrument(skip(provider))]
pub async fn download_file(
    provider: &impl StorageProvider,
    remote: &str,
    rev: Option<&str>,
    local: &Path,
) -> Result<FileMetadata, ClientError> {
    let partial = partial_path(local);
    let result = download_file_impl(provider, remote, rev, &partial, local).await;

    if let Err(e) = &result {
        trace!(error = ?e, "download failed");

        if let Err(error) = remove_file(&partial).await {
            if error.kind() != std::io::ErrorKind::NotFound {
                error!(?error, "error deleting partial download");
            }
        }
    }

    result.map_err(|e| {
        ClientError::action(
            format!("Could not download '{}' to '{}'", remote, local.display()),
            e,
        )
    })
}

async fn download_file_impl(
    provider: &impl StorageProvider,
    remote: &str,
    rev: Option<&str>,
    partial: &Path,
    local: &Path,
) -> Result<FileMetadata> {
    trace!("downloading file");
    let (meta, mut body) = provider.download(remote, rev).await?;

    trace!(size = meta.size, "download started");

    let mut hash = ContentHash::new();
    let mut received: u64 = 0;
    let mut file = File::create(partial)
        .await
        .with_context(|| format!("creating {}", partial.display()))?;

    while let Some(bytes) = body.next().await {
        let mut bytes = bytes?;
        trace!(size = bytes.len(), "received body chunk");
        received += bytes.len() as u64;
        hash.update(bytes.clone());
        file.write_all_buf(&mut bytes).await?;
    }

    trace!("eof reached");
    file.flush().await?;
    drop(file);

    if received != meta.size {
        return Err(anyhow!(
            "File size mismatch: expected {}, got {}",
            meta.size,
            received,
        ));
    }

    if let Some(expected) = &meta.content_hash {
        let actual = hash.finalize();
        if &actual != expected {
            return Err(anyhow!(
                "File hash mismatch: expected {}, got {}",
                expected,
                actual,
            ));
        }
    }

    rename(partial, local)
        .await
        .with_context(|| format!("moving download into {}", local.display()))?;

    Ok(meta)
}
