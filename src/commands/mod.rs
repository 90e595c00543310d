//! Subcommand handlers. Each turns parsed arguments into provider calls and
//! the responses into an [`Output`](crate::display::Output).

pub mod account;
pub mod files;
pub mod folder;

use crate::display::{convert_size, Record, Value};
use crate::paths::RootDestination;
use crate::provider::{FileMetadata, Metadata};
use crate::settings::Settings;
use chrono::{DateTime, Utc};

/// Tunables commands need beyond their own arguments.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Context {
    pub chunk_size: usize,
    pub root_destination: RootDestination,
}

impl From<&Settings> for Context {
    fn from(settings: &Settings) -> Self {
        Context {
            chunk_size: settings.chunk_size,
            root_destination: settings.root_destination,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::from(&Settings::default())
    }
}

pub const FILE_COLUMNS: &[&str] = &[
    "type",
    "name",
    "path",
    "id",
    "size",
    "rev",
    "content_hash",
    "client_modified",
    "last_modified",
];
pub const FOLDER_COLUMNS: &[&str] = &["type", "name", "path", "id"];
pub const DELETED_COLUMNS: &[&str] = &["type", "name", "path"];

fn timestamp(t: &DateTime<Utc>) -> Value {
    Value::Str(t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Single-character kind marker, as in a long directory listing.
pub fn entry_type(entry: &Metadata) -> &'static str {
    match entry {
        Metadata::File(_) => "-",
        Metadata::Folder(_) => "d",
        Metadata::Deleted(_) => "x",
    }
}

/// Columns that apply to this kind of entry.
pub fn entry_columns(entry: &Metadata) -> &'static [&'static str] {
    match entry {
        Metadata::File(_) => FILE_COLUMNS,
        Metadata::Folder(_) => FOLDER_COLUMNS,
        Metadata::Deleted(_) => DELETED_COLUMNS,
    }
}

pub fn file_record(file: &FileMetadata) -> Record {
    Record::from([
        ("type", Value::from("-")),
        ("name", Value::from(file.name.as_str())),
        ("path", Value::from(file.path_display.clone())),
        ("id", Value::from(file.id.as_str())),
        ("size", Value::from(convert_size(file.size))),
        ("rev", Value::from(file.rev.as_str())),
        ("content_hash", Value::from(file.content_hash.clone())),
        ("client_modified", timestamp(&file.client_modified)),
        ("last_modified", timestamp(&file.server_modified)),
    ])
}

/// Every displayable field of `entry`; fields that do not apply to the
/// entry's kind are absent.
pub fn entry_record(entry: &Metadata) -> Record {
    match entry {
        Metadata::File(file) => file_record(file),
        Metadata::Folder(folder) => Record::from([
            ("type", Value::from("d")),
            ("name", Value::from(folder.name.as_str())),
            ("path", Value::from(entry.path_display())),
            ("id", Value::from(folder.id.as_str())),
        ]),
        Metadata::Deleted(deleted) => Record::from([
            ("type", Value::from("x")),
            ("name", Value::from(deleted.name.as_str())),
            ("path", Value::from(entry.path_display())),
        ]),
    }
}
