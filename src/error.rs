use core::fmt;

/// Errors surfaced outside the simulation (config, storage, audio graph)
#[derive(Debug)]
pub enum GameError {
    /// Tuning or settings JSON could not be parsed
    Config(serde_json::Error),
    /// A tuning value is outside its allowed range
    InvalidTuning { field: &'static str, value: f32 },
    /// Storage backend unavailable or refused the operation
    Storage(String),
    /// A stored value could not be parsed
    CorruptValue { key: String, value: String },
    /// Audio context or node creation failed
    Audio(String),
    /// No usable GPU adapter, device or surface
    Render(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid config: {err}"),
            Self::InvalidTuning { field, value } => {
                write!(f, "tuning value {field}={value} out of range")
            }
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
            Self::CorruptValue { key, value } => {
                write!(f, "stored value for '{key}' is not valid: {value:?}")
            }
            Self::Audio(msg) => write!(f, "audio error: {msg}"),
            Self::Render(msg) => write!(f, "render error: {msg}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err)
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
