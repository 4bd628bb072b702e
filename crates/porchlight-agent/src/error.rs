//! Error types for the sync agent.

/// Errors that can occur in the sync agent's HTTP interactions.
///
/// Connection-level failures on the push channel are handled internally
/// by the reconnection loop and never surface here; these errors come
/// from the explicit request methods (`increment`, `update_settings`,
/// `fetch_state`).
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The HTTP request could not be sent or the response body could not
    /// be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, for the log line.
        body: String,
    },

    /// A response body did not parse as the expected shape.
    #[error("response parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}
