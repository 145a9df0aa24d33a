//! Error types for server startup and transport plumbing.
//!
//! Gameplay never produces errors: malformed events and unknown identities
//! are dropped by the router. These variants only cover infrastructure.

/// Failures that can stop the server process.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not be bound to the configured address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP/WebSocket listener stopped with an I/O error
    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),

    /// The event loop has shut down and can no longer accept messages
    #[error("Event loop is no longer running")]
    LoopClosed,

    /// A spawned server task panicked or was cancelled
    #[error("Server task failed: {0}")]
    Task(String),
}
