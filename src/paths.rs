//! Remote and local path helpers.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How an upload to exactly `/` is resolved.
#[derive(Copy, Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootDestination {
    /// Upload into the root folder under the source's base name.
    #[default]
    AppendName,
    /// Use `/` as the destination path unchanged.
    Literal,
}

/// Prefixes `path` with `/` unless it already has one.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Path as the API expects it; the root folder is spelled as "".
pub fn api_path(path: Option<&str>) -> String {
    match path {
        None | Some("") | Some("/") => String::new(),
        Some(p) => normalize_path(p),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Remote path an uploaded `source` ends up at.
pub fn resolve_destination(
    source: &Path,
    destination: Option<&str>,
    root: RootDestination,
) -> String {
    match destination {
        None => normalize_path(&base_name(source)),
        Some("/") if root == RootDestination::AppendName => normalize_path(&base_name(source)),
        Some(dest) => normalize_path(dest),
    }
}

/// Local file a download of `remote` is written to.
pub fn resolve_local_target(remote: &str, local: Option<&Path>) -> PathBuf {
    let name = base_name(Path::new(remote));
    match local {
        None => PathBuf::from(name),
        Some(dir) if dir.is_dir() => dir.join(name),
        Some(path) => path.to_path_buf(),
    }
}
