/// Crate-wide result alias.
pub type WallResult<T> = Result<T, WallError>;

/// Error taxonomy shared by the transport, geometry, compositor and work layers.
#[derive(thiserror::Error, Debug)]
pub enum WallError {
    /// Wall configuration is missing, unreadable or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket-level failure while sending or receiving.
    #[error("transport error: {0}")]
    Transport(String),

    /// Peer went away (detected by the availability probe or an EOF mid-frame).
    #[error("connection dropped: {0}")]
    ConnectionDropped(String),

    /// Payload codec reported a failure while decoding.
    #[error("codec error: {0}")]
    Codec(String),

    /// Bytes on the wire do not follow the expected layout.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Caller supplied arguments outside the supported range.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WallError {
    /// Build a [`WallError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`WallError::Transport`].
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`WallError::ConnectionDropped`].
    pub fn connection_dropped(msg: impl Into<String>) -> Self {
        Self::ConnectionDropped(msg.into())
    }

    /// Build a [`WallError::Codec`].
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Build a [`WallError::Protocol`].
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Build a [`WallError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Map an I/O error raised while moving frame bytes.
    ///
    /// An unexpected EOF means the peer closed mid-frame.
    pub(crate) fn from_io(what: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => Self::connection_dropped(format!("{what}: {err}")),
            _ => Self::transport(format!("{what}: {err}")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
