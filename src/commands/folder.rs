use crate::commands::{entry_record, entry_type, Context};
use crate::display::{get_display_data_multi, get_display_data_single, Output, Record, Value};
use crate::error::ClientError;
use crate::paths::{api_path, normalize_path};
use crate::provider::{Metadata, StorageProvider};
use clap::Args;
use tracing::debug;

/// Lists the content of a folder.
#[derive(Debug, Clone, Default, Args)]
pub struct FolderList {
    /// Folder to list, the root folder if omitted
    pub path: Option<String>,

    /// Use a long listing format
    #[arg(short, long)]
    pub long_listing: bool,

    /// List subfolders recursively
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Sort output by the column; may be repeated
    #[arg(short, long)]
    pub sort_column: Vec<String>,
}

impl FolderList {
    fn listing_name(&self, entry: &Metadata) -> String {
        let name = if self.recursive {
            entry.path_display()
        } else {
            entry.name()
        };

        match entry {
            Metadata::Folder(_) => format!("{name}/"),
            _ => name.to_owned(),
        }
    }

    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let path = api_path(self.path.as_deref());
        let entries = provider
            .list_folder(&path, self.recursive)
            .await
            .map_err(|e| {
                let shown = self.path.as_deref().unwrap_or("/");
                ClientError::action(format!("ls: cannot access '{shown}'"), e)
            })?;
        debug!(%path, count = entries.len(), "folder listed");

        let columns = if self.long_listing {
            vec!["type", "size", "last_modified", "name"]
        } else {
            vec!["name"]
        };

        let records: Vec<Record> = entries
            .iter()
            .map(|entry| {
                let mut record = entry_record(entry);
                record.insert("type", Value::from(entry_type(entry)));
                record.insert("name", Value::from(self.listing_name(entry)));
                record
            })
            .collect();

        let rows = get_display_data_multi(&columns, &records, &self.sort_column);
        Ok(Output::List { columns, rows })
    }
}

/// Creates a folder.
#[derive(Debug, Clone, Default, Args)]
pub struct FolderCreate {
    /// Path of the new folder
    pub path: String,

    /// Let the server pick a free name if the path is taken
    #[arg(long)]
    pub autorename: bool,
}

impl FolderCreate {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let path = normalize_path(&self.path);
        let folder = provider
            .create_folder(&path, self.autorename)
            .await
            .map_err(|e| {
                ClientError::action(format!("mkdir: cannot create folder '{path}'"), e)
            })?;

        let columns = vec!["id", "name", "path"];
        let record = entry_record(&Metadata::Folder(folder));
        let row = get_display_data_single(&columns, &record, &Value::Null);
        Ok(Output::Show { columns, row })
    }
}
