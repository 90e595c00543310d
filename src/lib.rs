pub mod cli;
pub mod commands;
pub mod display;
pub mod download;
pub mod dropbox;
pub mod error;
pub mod hash;
pub mod paths;
pub mod provider;
pub mod settings;
pub mod upload;

#[cfg(test)]
mod fake;
