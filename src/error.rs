use thiserror::Error;

/// Failures surfaced by loading, rendering and exporting.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ViewerError {
    /// The request never produced a usable HTTP response.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The backend answered, but flagged an error or sent malformed data.
    #[error("invalid graph payload: {0}")]
    Payload(String),

    /// A rendering target was asked for before it existed.
    #[error("render target `{0}` is not available")]
    MissingAnchor(&'static str),

    #[error("export failed: {0}")]
    Export(String),
}

impl ViewerError {
    pub(crate) fn payload(message: impl Into<String>) -> Self {
        Self::Payload(message.into())
    }

    pub(crate) fn fetch(url: &str, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
