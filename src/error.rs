//! Error types for image editing.

/// Errors that can occur while preparing, sending, or interpreting an edit.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The source image could not be read or encoded.
    #[error("failed to read image: {0}")]
    Read(String),

    /// No API credential is configured.
    #[error("{0}")]
    Configuration(String),

    /// Request preconditions were not met (empty prompt, empty image).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service finished without an image for a non-normal reason.
    #[error(
        "Image generation failed. Reason: {}.{} Please modify your prompt and try again.",
        .finish_reason,
        .block_reason.as_ref().map(|b| format!(" (Details: {b}).")).unwrap_or_default()
    )]
    GenerationRefused {
        /// Candidate finish reason, e.g. `SAFETY`.
        finish_reason: String,
        /// Block reason from the prompt feedback, if any.
        block_reason: Option<String>,
    },

    /// The service returned no image and gave no abnormal finish reason.
    #[error("No image data found in the API response. The response may have been empty or blocked.")]
    EmptyResponse,

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body as returned.
        message: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    /// Returns true for failures raised by the transport itself rather than
    /// by interpreting a successful response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. } | Self::Json(_))
    }

    /// Returns true if the failure is terminal for the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result type alias for image editing operations.
pub type Result<T> = std::result::Result<T, EditorError>;
