use crate::commands::account::{AccountInfoShow, SpaceUsageShow};
use crate::commands::files::{
    FileCopy, FileDelete, FileDownload, FileMove, FileRestore, FileRevisions, FileSearch,
    FileStatus, FileUpload,
};
use crate::commands::folder::{FolderCreate, FolderList};
use crate::commands::Context;
use crate::display::{Format, Output};
use crate::error::ClientError;
use crate::provider::StorageProvider;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dropme", version, about = "CLI tool for managing Dropbox environment")]
pub struct Cli {
    /// Access token; overrides the one in the settings file
    #[arg(
        short,
        long,
        global = true,
        env = "DBX_AUTH_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// Settings file to use instead of the discovered one
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show information about the current account
    Whoami(AccountInfoShow),

    /// Show space usage of the current account
    Df(SpaceUsageShow),

    /// List folder content
    Ls(FolderList),

    /// Create a folder
    Mkdir(FolderCreate),

    /// Delete a file or folder
    Rm(FileDelete),

    /// Copy a file or folder
    Cp(FileCopy),

    /// Move or rename a file or folder
    Mv(FileMove),

    /// Upload a local file
    #[command(visible_alias = "put")]
    Upload(FileUpload),

    /// Download a remote file
    #[command(visible_alias = "get")]
    Download(FileDownload),

    /// Search for files and folders
    Search(FileSearch),

    /// Show metadata of a file or folder
    #[command(visible_alias = "stat")]
    Status(FileStatus),

    /// List revisions of a file
    #[command(visible_alias = "revs")]
    Revisions(FileRevisions),

    /// Restore a file to an earlier revision
    Restore(FileRestore),
}

impl Command {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        ctx: &Context,
    ) -> Result<Output, ClientError> {
        match self {
            Command::Whoami(cmd) => cmd.execute(provider, ctx).await,
            Command::Df(cmd) => cmd.execute(provider, ctx).await,
            Command::Ls(cmd) => cmd.execute(provider, ctx).await,
            Command::Mkdir(cmd) => cmd.execute(provider, ctx).await,
            Command::Rm(cmd) => cmd.execute(provider, ctx).await,
            Command::Cp(cmd) => cmd.execute(provider, ctx).await,
            Command::Mv(cmd) => cmd.execute(provider, ctx).await,
            Command::Upload(cmd) => cmd.execute(provider, ctx).await,
            Command::Download(cmd) => cmd.execute(provider, ctx).await,
            Command::Search(cmd) => cmd.execute(provider, ctx).await,
            Command::Status(cmd) => cmd.execute(provider, ctx).await,
            Command::Revisions(cmd) => cmd.execute(provider, ctx).await,
            Command::Restore(cmd) => cmd.execute(provider, ctx).await,
        }
    }
}
