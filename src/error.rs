use thiserror::Error;

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while talking to the TV or the receiver
#[derive(Error, Debug)]
pub enum SyncError {
    /// Dial, write, read or HTTP transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request could not be serialized
    #[error("Encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Response did not have the expected shape or type
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The TV answered with its JSON-RPC error envelope
    #[error("Device error {code}: {message}")]
    Device {
        /// Error code reported by the TV
        code: i64,
        /// Error message reported by the TV
        message: String,
    },

    /// The receiver could not be reached and the loop is configured to give up
    #[error("Receiver unreachable: {0}")]
    ReceiverUnreachable(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether this error came from the transport rather than from the payload
    pub fn is_network(&self) -> bool {
        matches!(self, SyncError::Network(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::Network(format!("request timed out: {}", e))
        } else {
            SyncError::Network(e.to_string())
        }
    }
}
