mod provider;
pub mod transport;

pub use provider::Dropbox;
pub use transport::ApiError;
