/// Result alias that carries the custom [`ToneMemoryError`] type.
pub type Result<T> = std::result::Result<T, ToneMemoryError>;

/// Common error type for the core crate.
///
/// Every variant except [`ToneMemoryError::Json`] describes a programmer
/// error on the integrator's side. Operations that fail with one of them
/// leave the engine exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum ToneMemoryError {
    /// The layout table only covers one to twelve pairs.
    #[error("unsupported pair count {pair_count}, expected 1..=12")]
    Configuration { pair_count: usize },
    /// A card index outside the current board was passed in.
    #[error("card index {index} is out of range for a board of {len} cards")]
    IndexOutOfRange { index: usize, len: usize },
    /// A tone name that is not part of the chromatic catalog.
    #[error("unknown tone `{0}`")]
    UnknownTone(String),
    /// The same tone was listed twice in an initial tone set.
    #[error("tone `{0}` appears more than once in the tone set")]
    DuplicateTone(String),
    /// Free-form error for adapters that need to surface a readable message.
    #[error("{0}")]
    Message(String),
    /// Wrapper around snapshot (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors raised by terminal adapters.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ToneMemoryError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ToneMemoryError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ToneMemoryError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
