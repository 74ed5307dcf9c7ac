use thiserror::Error;

/// Errors raised while setting up or serving the link.
///
/// Once a [`LinkChannel`](crate::LinkChannel) is running, transport failures
/// are not errors: they show up as `is_connected() == false` and as
/// `send_line` returning `false`.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Peer closed the connection
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Line could not be framed or parsed
    #[error("Protocol error: {0}")]
    Protocol(#[from] locker_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
