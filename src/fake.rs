//! In-memory provider that records every call, for tests.

use crate::provider::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use std::sync::Mutex;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Call {
    CurrentAccount,
    SpaceUsage,
    ListFolder { path: String, recursive: bool },
    Upload { path: String, mode: WriteMode, autorename: bool, len: usize },
    SessionStart { len: usize },
    SessionAppend { session_id: String, offset: u64, len: usize },
    SessionFinish { session_id: String, offset: u64, len: usize, path: String, mode: WriteMode },
    Download { path: String, rev: Option<String> },
    Delete { path: String },
    Copy { from: String, to: String, autorename: bool },
    Move { from: String, to: String, autorename: bool },
    CreateFolder { path: String, autorename: bool },
    Metadata { path: String, include_deleted: bool },
    Search { query: SearchQuery },
    ListRevisions { path: String, limit: u64 },
    Restore { path: String, rev: String },
}

type CallHook = Box<dyn Fn(&Call) + Send + Sync>;

#[derive(Default)]
pub struct FakeProvider {
    pub calls: Mutex<Vec<Call>>,
    /// Runs after each call is recorded, before the call returns.
    pub on_call: Option<CallHook>,
    pub fail_on: Option<&'static str>,
    pub entries: Vec<Metadata>,
    pub account: Option<Account>,
    pub space: Option<SpaceUsage>,
    pub download_body: Vec<Bytes>,
    pub download_meta: Option<FileMetadata>,
}

pub fn file_meta(name: &str, size: u64) -> FileMetadata {
    FileMetadata {
        name: name.to_owned(),
        id: format!("id:{name}"),
        path_display: Some(format!("/{name}")),
        client_modified: Utc.with_ymd_and_hms(2017, 10, 29, 11, 12, 54).unwrap(),
        server_modified: Utc.with_ymd_and_hms(2017, 10, 29, 11, 12, 54).unwrap(),
        rev: "015a1b2c3d4e".to_owned(),
        size,
        content_hash: None,
    }
}

pub fn folder_meta(name: &str) -> FolderMetadata {
    FolderMetadata {
        name: name.to_owned(),
        id: format!("id:{name}"),
        path_display: Some(format!("/{name}")),
    }
}

impl FakeProvider {
    pub fn failing(operation: &'static str) -> Self {
        FakeProvider {
            fail_on: Some(operation),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Total payload of every upload call made so far.
    pub fn bytes_sent(&self) -> u64 {
        self.calls()
            .iter()
            .map(|c| match c {
                Call::Upload { len, .. }
                | Call::SessionStart { len }
                | Call::SessionAppend { len, .. }
                | Call::SessionFinish { len, .. } => *len as u64,
                _ => 0,
            })
            .sum()
    }

    fn record(&self, operation: &'static str, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if let Some(hook) = &self.on_call {
            hook(&call);
        }
        if self.fail_on == Some(operation) {
            return Err(anyhow!("{operation} rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for FakeProvider {
    async fn load_from_config(_config: ProviderConfig) -> Result<Self> {
        Ok(FakeProvider::default())
    }

    async fn current_account(&self) -> Result<Account> {
        self.record("current_account", Call::CurrentAccount)?;
        self.account.clone().ok_or_else(|| anyhow!("no account"))
    }

    async fn space_usage(&self) -> Result<SpaceUsage> {
        self.record("space_usage", Call::SpaceUsage)?;
        self.space.clone().ok_or_else(|| anyhow!("no space usage"))
    }

    async fn list_folder(&self, path: &str, recursive: bool) -> Result<Vec<Metadata>> {
        self.record(
            "list_folder",
            Call::ListFolder {
                path: path.to_owned(),
                recursive,
            },
        )?;
        Ok(self.entries.clone())
    }

    async fn upload(&self, content: Bytes, commit: &CommitInfo) -> Result<FileMetadata> {
        self.record(
            "upload",
            Call::Upload {
                path: commit.path.clone(),
                mode: commit.mode,
                autorename: commit.autorename,
                len: content.len(),
            },
        )?;
        Ok(file_meta(commit.path.trim_start_matches('/'), content.len() as u64))
    }

    async fn upload_session_start(&self, content: Bytes) -> Result<String> {
        self.record(
            "upload_session_start",
            Call::SessionStart { len: content.len() },
        )?;
        Ok("session-1".to_owned())
    }

    async fn upload_session_append(&self, content: Bytes, cursor: &UploadCursor) -> Result<()> {
        self.record(
            "upload_session_append",
            Call::SessionAppend {
                session_id: cursor.session_id.clone(),
                offset: cursor.offset,
                len: content.len(),
            },
        )
    }

    async fn upload_session_finish(
        &self,
        content: Bytes,
        cursor: &UploadCursor,
        commit: &CommitInfo,
    ) -> Result<FileMetadata> {
        self.record(
            "upload_session_finish",
            Call::SessionFinish {
                session_id: cursor.session_id.clone(),
                offset: cursor.offset,
                len: content.len(),
                path: commit.path.clone(),
                mode: commit.mode,
            },
        )?;
        Ok(file_meta(
            commit.path.trim_start_matches('/'),
            cursor.offset + content.len() as u64,
        ))
    }

    async fn download(&self, path: &str, rev: Option<&str>) -> Result<(FileMetadata, ByteStream)> {
        self.record(
            "download",
            Call::Download {
                path: path.to_owned(),
                rev: rev.map(str::to_owned),
            },
        )?;
        let meta = self
            .download_meta
            .clone()
            .ok_or_else(|| anyhow!("path/not_found/"))?;

        let mut body: Vec<Result<Bytes>> = self.download_body.iter().cloned().map(Ok).collect();
        if self.fail_on == Some("download_body") {
            body.push(Err(anyhow!("connection reset")));
        }
        let body: ByteStream = Box::pin(tokio_stream::iter(body));
        Ok((meta, body))
    }

    async fn delete(&self, path: &str) -> Result<Metadata> {
        self.record(
            "delete",
            Call::Delete {
                path: path.to_owned(),
            },
        )?;
        Ok(Metadata::File(file_meta(path.trim_start_matches('/'), 1)))
    }

    async fn copy(&self, from_path: &str, to_path: &str, autorename: bool) -> Result<Metadata> {
        self.record(
            "copy",
            Call::Copy {
                from: from_path.to_owned(),
                to: to_path.to_owned(),
                autorename,
            },
        )?;
        Ok(Metadata::File(file_meta(to_path.trim_start_matches('/'), 1)))
    }

    async fn move_entry(
        &self,
        from_path: &str,
        to_path: &str,
        autorename: bool,
    ) -> Result<Metadata> {
        self.record(
            "move_entry",
            Call::Move {
                from: from_path.to_owned(),
                to: to_path.to_owned(),
                autorename,
            },
        )?;
        Ok(Metadata::File(file_meta(to_path.trim_start_matches('/'), 1)))
    }

    async fn create_folder(&self, path: &str, autorename: bool) -> Result<FolderMetadata> {
        self.record(
            "create_folder",
            Call::CreateFolder {
                path: path.to_owned(),
                autorename,
            },
        )?;
        Ok(folder_meta(path.trim_start_matches('/')))
    }

    async fn metadata(&self, path: &str, include_deleted: bool) -> Result<Metadata> {
        self.record(
            "metadata",
            Call::Metadata {
                path: path.to_owned(),
                include_deleted,
            },
        )?;
        self.entries
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("path/not_found/"))
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        self.record(
            "search",
            Call::Search {
                query: query.clone(),
            },
        )?;
        Ok(SearchResult {
            matches: self
                .entries
                .iter()
                .cloned()
                .map(|metadata| SearchMatch {
                    match_type: SearchMatchType::Filename,
                    metadata,
                })
                .collect(),
            more: false,
            start: query.start + self.entries.len() as u64,
        })
    }

    async fn list_revisions(&self, path: &str, limit: u64) -> Result<Vec<FileMetadata>> {
        self.record(
            "list_revisions",
            Call::ListRevisions {
                path: path.to_owned(),
                limit,
            },
        )?;
        Ok(self
            .entries
            .iter()
            .filter_map(|e| match e {
                Metadata::File(f) => Some(f.clone()),
                _ => None,
            })
            .collect())
    }

    async fn restore(&self, path: &str, rev: &str) -> Result<FileMetadata> {
        self.record(
            "restore",
            Call::Restore {
                path: path.to_owned(),
                rev: rev.to_owned(),
            },
        )?;
        let mut meta = file_meta(path.trim_start_matches('/'), 1);
        meta.rev = rev.to_owned();
        Ok(meta)
    }
}
