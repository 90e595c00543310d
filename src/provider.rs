use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct ProviderConfig {
    pub token: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("token", &"*****")
            .finish()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Name {
    pub display_name: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub name: Name,
    pub email: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub team_member_id: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum SpaceAllocation {
    Individual { allocated: u64 },
    Team { used: u64, allocated: u64 },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct SpaceUsage {
    pub used: u64,
    pub allocation: SpaceAllocation,
}

impl SpaceUsage {
    /// Bytes allocated to the account, if the allocation kind is known.
    pub fn allocated(&self) -> Option<u64> {
        match self.allocation {
            SpaceAllocation::Individual { allocated } => Some(allocated),
            SpaceAllocation::Team { allocated, .. } => Some(allocated),
            SpaceAllocation::Other => None,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub path_display: Option<String>,
    pub client_modified: DateTime<Utc>,
    pub server_modified: DateTime<Utc>,
    pub rev: String,
    pub size: u64,
    #[serde(default)]
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct FolderMetadata {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub path_display: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct DeletedMetadata {
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
}

/// Any entry stored remotely.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum Metadata {
    File(FileMetadata),
    Folder(FolderMetadata),
    Deleted(DeletedMetadata),
}

impl Metadata {
    pub fn name(&self) -> &str {
        match self {
            Metadata::File(f) => &f.name,
            Metadata::Folder(f) => &f.name,
            Metadata::Deleted(d) => &d.name,
        }
    }

    /// Display path, falling back to the bare name when the API omits it.
    pub fn path_display(&self) -> &str {
        let path = match self {
            Metadata::File(f) => f.path_display.as_deref(),
            Metadata::Folder(f) => f.path_display.as_deref(),
            Metadata::Deleted(d) => d.path_display.as_deref(),
        };
        path.unwrap_or_else(|| self.name())
    }
}

#[derive(Copy, Debug, Clone, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Add,
    Overwrite,
}

/// Where and how an uploaded file is committed.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CommitInfo {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
}

impl CommitInfo {
    pub fn new(path: impl Into<String>, mode: WriteMode, autorename: bool) -> Self {
        CommitInfo {
            path: path.into(),
            mode,
            autorename,
            mute: false,
        }
    }
}

/// Position at which the next append or finish call continues a session.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct UploadCursor {
    pub session_id: String,
    pub offset: u64,
}

#[derive(Copy, Debug, Clone, Default, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Filename,
    FilenameAndContent,
    DeletedFilename,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SearchQuery {
    pub path: String,
    pub query: String,
    pub start: u64,
    pub max_results: u64,
    pub mode: SearchMode,
}

#[derive(Copy, Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum SearchMatchType {
    Filename,
    Content,
    Both,
}

impl SearchMatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMatchType::Filename => "filename",
            SearchMatchType::Content => "content",
            SearchMatchType::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct SearchMatch {
    pub match_type: SearchMatchType,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct SearchResult {
    pub matches: Vec<SearchMatch>,
    pub more: bool,
    pub start: u64,
}

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[async_trait]
pub trait StorageProvider: Send + Sync {
    // Initialize from resolved client configuration.
    async fn load_from_config(config: ProviderConfig) -> Result<Self>
    where
        Self: Sized;

    async fn current_account(&self) -> Result<Account>;

    async fn space_usage(&self) -> Result<SpaceUsage>;

    // Return every entry of a folder, following continuation pages.
    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Metadata>>;

    // Single request upload of the whole content.
    async fn upload(&self, content: Bytes, commit: &CommitInfo) -> Result<FileMetadata>;

    // Open an upload session with the first chunk, return its session id.
    async fn upload_session_start(&self, content: Bytes) -> Result<String>;

    async fn upload_session_append(&self, content: Bytes, cursor: &UploadCursor) -> Result<()>;

    // Send the last chunk and commit the session to its destination.
    async fn upload_session_finish(
        &self,
        content: Bytes,
        cursor: &UploadCursor,
        commit: &CommitInfo,
    ) -> Result<FileMetadata>;

    // Start a download, return the file metadata and its content stream.
    async fn download(&self, path: &str, rev: Option<&str>) -> Result<(FileMetadata, ByteStream)>;

    async fn delete(&self, path: &str) -> Result<Metadata>;

    async fn copy(&self, from_path: &str, to_path: &str, autorename: bool) -> Result<Metadata>;

    async fn move_entry(&self, from_path: &str, to_path: &str, autorename: bool)
        -> Result<Metadata>;

    async fn create_folder(&self, path: &str, autorename: bool) -> Result<FolderMetadata>;

    async fn metadata(&self, path: &str, include_deleted: bool) -> Result<Metadata>;

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult>;

    async fn list_revisions(&self, path: &str, limit: u64) -> Result<Vec<FileMetadata>>;

    async fn restore(&self, path: &str, rev: &str) -> Result<FileMetadata>;
}
