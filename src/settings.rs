//! Client settings: discovery of `settings.yaml` and token resolution.

use crate::error::ClientError;
use crate::paths::RootDestination;
use crate::upload::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SETTINGS_FILE: &str = "settings.yaml";

#[derive(Clone, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token: Option<String>,
    pub chunk_size: usize,
    pub root_destination: RootDestination,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            token: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            root_destination: RootDestination::default(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &self.token.as_ref().map(|_| "*****"))
            .field("chunk_size", &self.chunk_size)
            .field("root_destination", &self.root_destination)
            .finish()
    }
}

/// A place a settings file may live, in priority order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SettingsSource {
    /// Given on the command line; used even if it does not exist.
    Explicit(PathBuf),
    /// Shipped next to the executable.
    Bundled(PathBuf),
    /// Per-user configuration directory.
    User(PathBuf),
}

impl SettingsSource {
    pub fn path(&self) -> &Path {
        match self {
            SettingsSource::Explicit(p) | SettingsSource::Bundled(p) | SettingsSource::User(p) => p,
        }
    }
}

/// Candidate locations, highest priority first.
pub fn default_sources(explicit: Option<&Path>) -> Vec<SettingsSource> {
    let mut sources = vec![];

    if let Some(path) = explicit {
        sources.push(SettingsSource::Explicit(path.to_path_buf()));
    }

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        sources.push(SettingsSource::Bundled(dir.join(SETTINGS_FILE)));
    }

    if let Some(dirs) = ProjectDirs::from("", "", "dropme") {
        sources.push(SettingsSource::User(dirs.config_dir().join(SETTINGS_FILE)));
    }

    sources
}

/// Picks the first usable source.
pub fn resolve_settings_path(
    sources: &[SettingsSource],
    is_file: impl Fn(&Path) -> bool,
) -> Result<PathBuf, ClientError> {
    sources
        .iter()
        .find(|source| match source {
            SettingsSource::Explicit(_) => true,
            SettingsSource::Bundled(p) | SettingsSource::User(p) => is_file(p),
        })
        .map(|source| source.path().to_path_buf())
        .ok_or_else(|| {
            ClientError::ConfigNotFound(format!("Configuration '{SETTINGS_FILE}' file not found."))
        })
}

/// Parses settings from YAML; an empty document yields the defaults.
pub fn parse_settings(text: &str) -> Result<Settings, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(text)
}

pub fn read_settings(path: &Path) -> Result<Settings, ClientError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ClientError::invalid_file(
            format!("Could not read settings from {}.", path.display()),
            e,
        )
    })?;
    let settings = parse_settings(&text).map_err(|e| {
        ClientError::invalid_file(format!("Malformed settings file {}.", path.display()), e)
    })?;

    if settings.chunk_size == 0 || settings.chunk_size > MAX_CHUNK_SIZE {
        return Err(ClientError::InvalidFile {
            message: format!(
                "Invalid chunk_size {} in {}: must be between 1 and {} bytes.",
                settings.chunk_size,
                path.display(),
                MAX_CHUNK_SIZE
            ),
            source: None,
        });
    }

    debug!(path = %path.display(), ?settings, "settings loaded");
    Ok(settings)
}

/// Loads settings from the first usable source.
///
/// When a token is already known, a missing settings file or an unusable
/// discovered one falls back to the defaults. A file named explicitly must
/// always be valid.
pub fn load_settings(
    sources: &[SettingsSource],
    token_supplied: bool,
) -> Result<Settings, ClientError> {
    let path = match resolve_settings_path(sources, Path::is_file) {
        Ok(path) => path,
        Err(ClientError::ConfigNotFound(_)) if token_supplied => return Ok(Settings::default()),
        Err(e) => return Err(e),
    };

    let explicit = sources
        .iter()
        .any(|s| matches!(s, SettingsSource::Explicit(p) if *p == path));

    match read_settings(&path) {
        Err(error @ ClientError::InvalidFile { .. }) if token_supplied && !explicit => {
            warn!(%error, "ignoring settings file");
            Ok(Settings::default())
        }
        result => result,
    }
}

/// Token from the command line (or environment) first, then from settings.
pub fn resolve_token(supplied: Option<&str>, settings: &Settings) -> Result<String, ClientError> {
    supplied
        .or(settings.token.as_deref())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ClientError::ConfigNotFound("Token not found.".to_owned()))
}
