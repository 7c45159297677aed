use thiserror::Error;

/// Result type for mixer operations
pub type Result<T> = std::result::Result<T, MixerError>;

/// Errors that can occur when talking to a jamyxer server
#[derive(Error, Debug)]
pub enum MixerError {
    /// Could not open a connection to the server
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialed
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Dialing the server took longer than the configured connect timeout
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(String),

    /// The server closed the connection before a complete reply arrived
    #[error("Connection closed")]
    ConnectionClosed,

    /// I/O error on an open connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply bytes were not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reply grew past the configured size limit without completing
    #[error("Reply exceeds {0} bytes")]
    ReplyTooLarge(usize),

    /// Volume or balance is NaN or infinite
    #[error("Invalid level: {0}")]
    InvalidLevel(f32),

    /// A required field was absent from a reply
    #[error("Malformed reply: missing field {0}")]
    MissingField(&'static str),

    /// A reply field had an unexpected dynamic type or value
    #[error("Malformed reply: field {field} is not {expected}")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
        /// What the field should have contained
        expected: &'static str,
    },

    /// Invalid or unexpected response shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server answered with an error reply
    #[error("Server error: {detail}")]
    Server {
        /// Error message sent by the server
        detail: String,
    },

    /// A listen was cancelled before the server replied
    #[error("Cancelled")]
    Cancelled,

    /// Channel receive error
    #[error("Channel error: {0}")]
    ChannelError(String),
}
