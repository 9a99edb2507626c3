use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API key is required; set OPENROUTER_API_KEY or enter it at the prompt")]
    CredentialMissing,

    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("malformed conversation data: {0}")]
    Parse(String),

    #[error("failed to encode conversation: {0}")]
    Encode(String),

    #[error("file error on '{}': {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("unknown command '{0}'; type '/help' for available commands")]
    UnknownCommand(String),
}

impl ChatError {
    pub(crate) fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }
}
