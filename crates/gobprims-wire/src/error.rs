/// Errors that can occur while encoding or decoding wire primitives and messages.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The buffer ended before a complete primitive was read.
    #[error("unexpected end of message")]
    UnexpectedEof,

    /// An unsigned integer announced more bytes than fit in 64 bits.
    #[error("encoded unsigned integer out of range ({len} bytes, max 8)")]
    IntegerOverflow { len: usize },

    /// A byte string decoded as text is not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// A decoded length or count does not fit the platform.
    #[error("count out of range: {0}")]
    CountOutOfRange(u64),

    /// A message exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: u64, max: usize },

    /// A message announced a zero-length payload.
    #[error("empty message")]
    EmptyMessage,

    /// The stream ended cleanly at a message boundary.
    #[error("end of stream")]
    EndOfStream,

    /// The stream ended in the middle of a message.
    #[error("stream truncated ({buffered} bytes of an incomplete message)")]
    Truncated { buffered: usize },

    /// An I/O error occurred while reading or writing messages.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;
