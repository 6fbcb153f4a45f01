use thiserror::Error;

/// Failure of a request/response command against the remote authority.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("authority answered {status}: {body}")]
    Status { status: u16, body: String },
    /// HTTP 409; only contact creation gives it a distinct user-facing message.
    #[error("resource already exists")]
    Conflict,
    #[error("transport: {0}")]
    Transport(String),
    #[error("decode reply: {0}")]
    Decode(String),
    #[error("network disabled")]
    NetworkDisabled,
}

impl From<reqwest::Error> for CommandError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CommandError::Decode(e.to_string())
        } else {
            CommandError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("malformed channel message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("channel closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preferences db: {0}")]
    Db(#[from] rusqlite::Error),
}
