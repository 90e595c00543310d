use crate::error::ClientError;
use crate::provider::{CommitInfo, FileMetadata, StorageProvider, UploadCursor, WriteMode};
use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument, trace};

/// Default upload chunk size, also the single-request upload threshold.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Largest payload the API accepts in one request.
pub const MAX_CHUNK_SIZE: usize = 150 * 1024 * 1024;

/// Sequential fixed-size reader over a byte source.
pub struct ChunkReader<R> {
    source: R,
    chunk_size: usize,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(source: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        ChunkReader { source, chunk_size }
    }

    /// Next chunk of exactly `chunk_size` bytes, shorter only at the end of
    /// the source. `None` once the source is exhausted.
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        let mut buffer = BytesMut::with_capacity(self.chunk_size);

        // Reads may return less than asked for; collate them into one chunk.
        while buffer.len() < self.chunk_size {
            let mut limited = (&mut self.source).take((self.chunk_size - buffer.len()) as u64);
            if limited.read_buf(&mut buffer).await? == 0 {
                break;
            }
        }

        if buffer.is_empty() {
            trace!("eof reached");
            return Ok(None);
        }

        Ok(Some(buffer.freeze()))
    }
}

/// State of an in-progress chunked upload.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UploadSession {
    pub session_id: String,
    pub offset: u64,
    pub destination_path: String,
    pub autorename: bool,
}

impl UploadSession {
    pub fn cursor(&self) -> UploadCursor {
        UploadCursor {
            session_id: self.session_id.clone(),
            offset: self.offset,
        }
    }
}

/// Uploads `source` to `destination`, using an upload session when the file
/// is larger than `chunk_size`.
///
/// Any failure aborts the upload; nothing is retried.
#[instrument(skip(provider))]
pub async fn upload_file(
    provider: &impl StorageProvider,
    source: &Path,
    destination: &str,
    mode: WriteMode,
    autorename: bool,
    chunk_size: usize,
) -> Result<FileMetadata, ClientError> {
    upload_file_impl(provider, source, destination, mode, autorename, chunk_size)
        .await
        .map_err(|e| {
            ClientError::action(
                format!(
                    "Could not upload '{}' to '{}'",
                    source.display(),
                    destination
                ),
                e,
            )
        })
}

async fn upload_file_impl(
    provider: &impl StorageProvider,
    source: &Path,
    destination: &str,
    mode: WriteMode,
    autorename: bool,
    chunk_size: usize,
) -> Result<FileMetadata> {
    let file = File::open(source)
        .await
        .with_context(|| format!("opening {}", source.display()))?;
    let file_size = file.metadata().await?.len();
    let commit = CommitInfo::new(destination, mode, autorename);

    // Never send more than was there when the upload started.
    let mut reader = ChunkReader::new(file.take(file_size), chunk_size);
    let chunk_size = chunk_size as u64;

    trace!(file_size, chunk_size, "uploading file");

    if file_size <= chunk_size {
        let content = reader.next_chunk().await?.unwrap_or_default();
        check_chunk_len(&content, file_size)?;
        return provider.upload(content, &commit).await;
    }

    let first = reader.next_chunk().await?.unwrap_or_default();
    check_chunk_len(&first, chunk_size)?;
    let sent = first.len() as u64;
    let session_id = provider.upload_session_start(first).await?;
    debug!(%session_id, "upload session started");

    let mut session = UploadSession {
        session_id,
        offset: sent,
        destination_path: destination.to_owned(),
        autorename,
    };

    while file_size - session.offset > chunk_size {
        let chunk = reader.next_chunk().await?.unwrap_or_default();
        check_chunk_len(&chunk, chunk_size)?;

        trace!(
            offset = session.offset,
            len = chunk.len(),
            "appending chunk"
        );
        let len = chunk.len() as u64;
        provider
            .upload_session_append(chunk, &session.cursor())
            .await?;
        session.offset += len;
    }

    let last = reader.next_chunk().await?.unwrap_or_default();
    check_chunk_len(&last, file_size - session.offset)?;

    trace!(offset = session.offset, len = last.len(), "finishing session");
    provider
        .upload_session_finish(last, &session.cursor(), &commit)
        .await
}

fn check_chunk_len(chunk: &Bytes, expected: u64) -> Result<()> {
    if chunk.len() as u64 != expected {
        let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        return Err(anyhow::Error::new(eof).context(format!(
            "source changed during upload: expected {} bytes, read {}",
            expected,
            chunk.len()
        )));
    }
    Ok(())
}
