/// Core error type for the moderation bot.
///
/// Adapter crates map their specific errors into this type so the pipeline
/// can tell a permission problem at delete time from any other failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Membership or identity lookup could not be completed.
    #[error("chat platform unavailable: {0}")]
    RemoteUnavailable(String),

    /// Delete rejected as forbidden / bad request.
    #[error("delete rejected: {0}")]
    DeletePermission(String),

    #[error("delete failed: {0}")]
    DeleteOther(String),

    #[error("reply failed: {0}")]
    Reply(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_delete_permission(&self) -> bool {
        matches!(self, Error::DeletePermission(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
