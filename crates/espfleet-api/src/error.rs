use thiserror::Error;

/// Top-level error type for the `espfleet-api` crate.
///
/// Covers every way a telemetry hit can fail to reach the tracking
/// endpoint. `espfleet-core` wraps these into its own error type.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Endpoint ────────────────────────────────────────────────────
    /// The tracking endpoint answered with a non-success status.
    #[error("Tracking endpoint rejected hit (HTTP {status})")]
    Rejected { status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// Custom variables could not be encoded.
    #[error("Failed to encode custom variables: {0}")]
    Encoding(#[from] serde_json::Error),

    // ── Runtime ─────────────────────────────────────────────────────
    /// A fire-and-forget delivery was requested outside a tokio runtime.
    #[error("No async runtime available for background delivery")]
    NoRuntime,
}

impl Error {
    /// HTTP status code attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Rejected { status } => Some(*status),
            _ => None,
        }
    }
}
