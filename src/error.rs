use std::fmt::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced to the user by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No settings file could be located, or no token is configured.
    #[error("{0}")]
    ConfigNotFound(String),

    /// A settings file was found but could not be read or parsed.
    #[error("{message}")]
    InvalidFile {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Arguments were syntactically fine but cannot be acted upon.
    #[error("{0}")]
    Validation(String),

    /// A remote call or local I/O failed while executing a command.
    #[error("{message}")]
    Action {
        message: String,
        #[source]
        source: BoxError,
    },
}

impl ClientError {
    pub fn invalid_file(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ClientError::InvalidFile {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wraps `error` with the operation and path(s) it happened on.
    ///
    /// The underlying reason (including any `anyhow` context chain) is
    /// appended to `context` so the user sees both.
    pub fn action(context: impl Display, error: impl Into<anyhow::Error>) -> Self {
        let error = error.into();
        ClientError::Action {
            message: format!("{context}: {error:#}"),
            source: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClientError;
    use std::error::Error;

    #[test]
    fn action_message_includes_reason() {
        let e = ClientError::action(
            "ls: cannot access '/missing'",
            anyhow::anyhow!("path/not_found/"),
        );
        assert_eq!(e.to_string(), "ls: cannot access '/missing': path/not_found/");
        assert!(e.source().is_some());
    }

    #[test]
    fn action_message_keeps_context_chain() {
        let inner = anyhow::anyhow!("connection reset").context("sending request");
        let e = ClientError::action("rm '/a'", inner);
        assert_eq!(e.to_string(), "rm '/a': sending request: connection reset");
    }
}
