use crate::dropbox::transport::Transport;
use crate::provider::*;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::{instrument, trace};

#[derive(Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct CursorArg<'a> {
    cursor: &'a str,
}

#[derive(Deserialize)]
struct ListFolderResult {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

#[derive(Serialize)]
struct SessionStartArg {
    close: bool,
}

#[derive(Deserialize)]
struct SessionStartResult {
    session_id: String,
}

#[derive(Serialize)]
struct SessionAppendArg<'a> {
    cursor: &'a UploadCursor,
    close: bool,
}

#[derive(Serialize)]
struct SessionFinishArg<'a> {
    cursor: &'a UploadCursor,
    commit: &'a CommitInfo,
}

#[derive(Serialize)]
struct DownloadArg<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rev: Option<&'a str>,
}

#[derive(Serialize)]
struct RelocationArg<'a> {
    from_path: &'a str,
    to_path: &'a str,
    autorename: bool,
}

#[derive(Serialize)]
struct CreateFolderArg<'a> {
    path: &'a str,
    autorename: bool,
}

#[derive(Serialize)]
struct GetMetadataArg<'a> {
    path: &'a str,
    include_deleted: bool,
}

#[derive(Serialize)]
struct ListRevisionsArg<'a> {
    path: &'a str,
    mode: &'static str,
    limit: u64,
}

#[derive(Serialize)]
struct RestoreArg<'a> {
    path: &'a str,
    rev: &'a str,
}

#[derive(Deserialize)]
struct MetadataResult<T> {
    metadata: T,
}

#[derive(Deserialize)]
struct ListRevisionsResult {
    entries: Vec<FileMetadata>,
}

/// Dropbox API v2 backend.
#[derive(Debug)]
pub struct Dropbox {
    transport: Transport,
}

impl Dropbox {
    pub fn new(transport: Transport) -> Dropbox {
        Dropbox { transport }
    }
}

#[async_trait]
impl StorageProvider for Dropbox {
    #[instrument]
    async fn load_from_config(config: ProviderConfig) -> Result<Self> {
        Ok(Dropbox::new(Transport::new(config.token)?))
    }

    async fn current_account(&self) -> Result<Account> {
        self.transport.rpc("users/get_current_account", &()).await
    }

    async fn space_usage(&self) -> Result<SpaceUsage> {
        self.transport.rpc("users/get_space_usage", &()).await
    }

    #[instrument(skip(self))]
    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Metadata>> {
        let mut page: ListFolderResult = self
            .transport
            .rpc("files/list_folder", &ListFolderArg { path, recursive })
            .await?;
        let mut entries = std::mem::take(&mut page.entries);

        while page.has_more {
            trace!(received = entries.len(), "fetching next page");
            let cursor = std::mem::take(&mut page.cursor);
            page = self
                .transport
                .rpc("files/list_folder/continue", &CursorArg { cursor: &cursor })
                .await?;
            entries.append(&mut page.entries);
        }

        Ok(entries)
    }

    async fn upload(&self, content: Bytes, commit: &CommitInfo) -> Result<FileMetadata> {
        self.transport.upload("files/upload", commit, content).await
    }

    async fn upload_session_start(&self, content: Bytes) -> Result<String> {
        let result: SessionStartResult = self
            .transport
            .upload(
                "files/upload_session/start",
                &SessionStartArg { close: false },
                content,
            )
            .await?;
        Ok(result.session_id)
    }

    async fn upload_session_append(&self, content: Bytes, cursor: &UploadCursor) -> Result<()> {
        self.transport
            .upload(
                "files/upload_session/append_v2",
                &SessionAppendArg {
                    cursor,
                    close: false,
                },
                content,
            )
            .await
    }

    async fn upload_session_finish(
        &self,
        content: Bytes,
        cursor: &UploadCursor,
        commit: &CommitInfo,
    ) -> Result<FileMetadata> {
        self.transport
            .upload(
                "files/upload_session/finish",
                &SessionFinishArg { cursor, commit },
                content,
            )
            .await
    }

    async fn download(&self, path: &str, rev: Option<&str>) -> Result<(FileMetadata, ByteStream)> {
        let (meta, resp): (FileMetadata, _) = self
            .transport
            .download("files/download", &DownloadArg { path, rev })
            .await?;

        let body: ByteStream =
            Box::pin(resp.bytes_stream().map(|chunk| chunk.map_err(anyhow::Error::from)));
        Ok((meta, body))
    }

    async fn delete(&self, path: &str) -> Result<Metadata> {
        let result: MetadataResult<Metadata> = self
            .transport
            .rpc("files/delete_v2", &PathArg { path })
            .await?;
        Ok(result.metadata)
    }

    async fn copy(&self, from_path: &str, to_path: &str, autorename: bool) -> Result<Metadata> {
        let result: MetadataResult<Metadata> = self
            .transport
            .rpc(
                "files/copy_v2",
                &RelocationArg {
                    from_path,
                    to_path,
                    autorename,
                },
            )
            .await?;
        Ok(result.metadata)
    }

    async fn move_entry(
        &self,
        from_path: &str,
        to_path: &str,
        autorename: bool,
    ) -> Result<Metadata> {
        let result: MetadataResult<Metadata> = self
            .transport
            .rpc(
                "files/move_v2",
                &RelocationArg {
                    from_path,
                    to_path,
                    autorename,
                },
            )
            .await?;
        Ok(result.metadata)
    }

    async fn create_folder(&self, path: &str, autorename: bool) -> Result<FolderMetadata> {
        let result: MetadataResult<FolderMetadata> = self
            .transport
            .rpc(
                "files/create_folder_v2",
                &CreateFolderArg { path, autorename },
            )
            .await?;
        Ok(result.metadata)
    }

    async fn metadata(&self, path: &str, include_deleted: bool) -> Result<Metadata> {
        self.transport
            .rpc(
                "files/get_metadata",
                &GetMetadataArg {
                    path,
                    include_deleted,
                },
            )
            .await
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        self.transport.rpc("files/search", query).await
    }

    async fn list_revisions(&self, path: &str, limit: u64) -> Result<Vec<FileMetadata>> {
        let result: ListRevisionsResult = self
            .transport
            .rpc(
                "files/list_revisions",
                &ListRevisionsArg {
                    path,
                    mode: "path",
                    limit,
                },
            )
            .await?;
        Ok(result.entries)
    }

    async fn restore(&self, path: &str, rev: &str) -> Result<FileMetadata> {
        self.transport
            .rpc("files/restore", &RestoreArg { path, rev })
            .await
    }
}
