pub type WavesceneResult<T> = Result<T, WavesceneError>;

#[derive(thiserror::Error, Debug)]
pub enum WavesceneError {
    /// Setup-time contract violation (empty layer list, bad color string,
    /// contradictory audio wiring). Fatal; no partial construction.
    #[error("validation error: {0}")]
    Validation(String),

    /// Per-frame render failure for one layer. The scheduler logs these and
    /// skips the layer for the tick instead of aborting the frame.
    #[error("render error: {0}")]
    Render(String),

    /// Font fetch/build failure. The affected text node stays `Loading`.
    #[error("asset error: {0}")]
    Asset(String),

    /// Media-source wiring failure. Non-fatal; the session continues without
    /// audio reactivity.
    #[error("audio error: {0}")]
    Audio(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WavesceneError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }
}
