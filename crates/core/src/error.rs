/// Result alias that carries the custom [`CanvasError`] type.
pub type Result<T> = std::result::Result<T, CanvasError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// Free-form failure surfaced to the host as a readable message.
    #[error("{0}")]
    Message(String),
    /// A caller handed in data the operation cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Shared state guarded by a mutex was poisoned by a panicking thread.
    #[error("{0} has been poisoned")]
    Poisoned(&'static str),
    /// Shared state is held by another thread right now; try again later.
    #[error("{0} is busy")]
    Busy(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// The FFT backend rejected the buffers it was given.
    #[error("fft failure: {0}")]
    Fft(#[from] realfft::FftError),
}

impl CanvasError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for CanvasError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CanvasError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
