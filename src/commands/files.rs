use crate::commands::{entry_columns, entry_record, file_record, Context};
use crate::display::{
    convert_size, get_display_data_multi, get_display_data_single, Output, Record, Value,
};
use crate::download::download_file;
use crate::error::ClientError;
use crate::paths::{api_path, normalize_path, resolve_destination, resolve_local_target};
use crate::provider::{SearchMode, SearchQuery, StorageProvider, WriteMode};
use crate::upload::upload_file;
use clap::Args;
use std::path::PathBuf;

/// Deletes a file or folder.
#[derive(Debug, Clone, Default, Args)]
pub struct FileDelete {
    /// Path to delete
    pub path: String,
}

impl FileDelete {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let path = normalize_path(&self.path);
        provider
            .delete(&path)
            .await
            .map_err(|e| ClientError::action(format!("rm: cannot remove '{path}'"), e))?;

        Ok(Output::Message(format!("'{path}' has been deleted.")))
    }
}

/// Source and destination of a copy or move.
#[derive(Debug, Clone, Default, Args)]
pub struct Relocation {
    /// Existing path
    pub from_path: String,

    /// New path
    pub to_path: String,

    /// Let the server pick a free name if the destination is taken
    #[arg(long)]
    pub autorename: bool,
}

/// Copies a file or folder.
#[derive(Debug, Clone, Default, Args)]
pub struct FileCopy {
    #[command(flatten)]
    pub paths: Relocation,
}

impl FileCopy {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let from = normalize_path(&self.paths.from_path);
        let to = normalize_path(&self.paths.to_path);
        let entry = provider
            .copy(&from, &to, self.paths.autorename)
            .await
            .map_err(|e| ClientError::action(format!("cp: cannot copy '{from}' to '{to}'"), e))?;

        Ok(Output::Message(format!(
            "'{from}' copied to '{}'.",
            entry.path_display()
        )))
    }
}

/// Moves or renames a file or folder.
#[derive(Debug, Clone, Default, Args)]
pub struct FileMove {
    #[command(flatten)]
    pub paths: Relocation,
}

impl FileMove {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let from = normalize_path(&self.paths.from_path);
        let to = normalize_path(&self.paths.to_path);
        let entry = provider
            .move_entry(&from, &to, self.paths.autorename)
            .await
            .map_err(|e| ClientError::action(format!("mv: cannot move '{from}' to '{to}'"), e))?;

        Ok(Output::Message(format!(
            "'{from}' moved to '{}'.",
            entry.path_display()
        )))
    }
}

/// Uploads a local file.
#[derive(Debug, Clone, Default, Args)]
pub struct FileUpload {
    /// Local file to upload
    pub source: PathBuf,

    /// Remote destination path, the file's name in the root folder if omitted
    pub destination: Option<String>,

    /// Let the server pick a free name if the destination is taken
    #[arg(long)]
    pub autorename: bool,

    /// Replace an existing file at the destination
    #[arg(long)]
    pub overwrite: bool,
}

impl FileUpload {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        ctx: &Context,
    ) -> Result<Output, ClientError> {
        if !self.source.exists() {
            return Err(ClientError::Validation(format!(
                "upload: '{}' does not exist.",
                self.source.display()
            )));
        }
        if !self.source.is_file() {
            return Err(ClientError::Validation(format!(
                "upload: '{}' is not a file.",
                self.source.display()
            )));
        }

        let destination = resolve_destination(
            &self.source,
            self.destination.as_deref(),
            ctx.root_destination,
        );
        let mode = if self.overwrite {
            WriteMode::Overwrite
        } else {
            WriteMode::Add
        };

        let meta = upload_file(
            provider,
            &self.source,
            &destination,
            mode,
            self.autorename,
            ctx.chunk_size,
        )
        .await?;

        Ok(Output::Message(format!(
            "'{}' uploaded to '{}' ({}).",
            self.source.display(),
            meta.path_display.as_deref().unwrap_or(&destination),
            convert_size(meta.size)
        )))
    }
}

/// Downloads a remote file.
#[derive(Debug, Clone, Default, Args)]
pub struct FileDownload {
    /// Remote file to download
    pub path: String,

    /// Local file or directory, the current directory if omitted
    pub local: Option<PathBuf>,

    /// Download this revision instead of the latest one
    #[arg(short, long)]
    pub rev: Option<String>,
}

impl FileDownload {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let remote = normalize_path(&self.path);
        let local = resolve_local_target(&remote, self.local.as_deref());

        if local.is_dir() {
            return Err(ClientError::Validation(format!(
                "download: '{}' is a directory.",
                local.display()
            )));
        }

        let meta = download_file(provider, &remote, self.rev.as_deref(), &local).await?;

        Ok(Output::Message(format!(
            "'{}' downloaded to '{}' ({}).",
            remote,
            local.display(),
            convert_size(meta.size)
        )))
    }
}

/// Searches for files and folders.
#[derive(Debug, Clone, Args)]
pub struct FileSearch {
    /// String to search for
    pub query: String,

    /// Folder to search in, the root folder if omitted
    pub path: Option<String>,

    /// What to match the query against
    #[arg(long, value_enum, default_value_t = SearchMode::Filename)]
    pub mode: SearchMode,

    /// Index of the first match to return
    #[arg(long, default_value_t = 0)]
    pub start: u64,

    /// Maximum number of matches to return
    #[arg(long, default_value_t = 100)]
    pub max_results: u64,

    /// Sort output by the column; may be repeated
    #[arg(short, long)]
    pub sort_column: Vec<String>,
}

impl FileSearch {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let query = SearchQuery {
            path: api_path(self.path.as_deref()),
            query: self.query.clone(),
            start: self.start,
            max_results: self.max_results,
            mode: self.mode,
        };

        let result = provider.search(&query).await.map_err(|e| {
            ClientError::action(
                format!(
                    "search: cannot search for '{}' in '{}'",
                    self.query,
                    self.path.as_deref().unwrap_or("/")
                ),
                e,
            )
        })?;

        let columns = vec!["match", "type", "name", "path"];
        let records: Vec<Record> = result
            .matches
            .iter()
            .map(|m| {
                let mut record = entry_record(&m.metadata);
                record.insert("match", Value::from(m.match_type.as_str()));
                record
            })
            .collect();

        let rows = get_display_data_multi(&columns, &records, &self.sort_column);
        Ok(Output::List { columns, rows })
    }
}

/// Shows metadata of a file or folder.
#[derive(Debug, Clone, Default, Args)]
pub struct FileStatus {
    /// Path to inspect
    pub path: String,

    /// Report deleted entries instead of failing
    #[arg(long)]
    pub include_deleted: bool,
}

impl FileStatus {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let path = normalize_path(&self.path);
        let entry = provider
            .metadata(&path, self.include_deleted)
            .await
            .map_err(|e| ClientError::action(format!("status: cannot stat '{path}'"), e))?;

        let columns = entry_columns(&entry).to_vec();
        let row = get_display_data_single(&columns, &entry_record(&entry), &Value::Null);
        Ok(Output::Show { columns, row })
    }
}

/// Lists revisions of a file.
#[derive(Debug, Clone, Args)]
pub struct FileRevisions {
    /// File whose revisions to list
    pub path: String,

    /// Maximum number of revisions to return
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: u64,

    /// Sort output by the column; may be repeated
    #[arg(short, long)]
    pub sort_column: Vec<String>,
}

impl FileRevisions {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let path = normalize_path(&self.path);
        let revisions = provider
            .list_revisions(&path, self.limit)
            .await
            .map_err(|e| {
                ClientError::action(format!("revisions: cannot list revisions of '{path}'"), e)
            })?;

        let columns = vec!["rev", "size", "last_modified", "name"];
        let records: Vec<Record> = revisions.iter().map(file_record).collect();
        let rows = get_display_data_multi(&columns, &records, &self.sort_column);
        Ok(Output::List { columns, rows })
    }
}

/// Restores a file to an earlier revision.
#[derive(Debug, Clone, Default, Args)]
pub struct FileRestore {
    /// File to restore
    pub path: String,

    /// Revision to restore
    pub rev: String,
}

impl FileRestore {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let path = normalize_path(&self.path);
        let meta = provider.restore(&path, &self.rev).await.map_err(|e| {
            ClientError::action(
                format!("restore: cannot restore '{path}' to revision '{}'", self.rev),
                e,
            )
        })?;

        Ok(Output::Message(format!(
            "'{path}' restored to revision '{}'.",
            meta.rev
        )))
    }
}
