use thiserror::Error;

/// Broad category of a failure, used by shells to decide how to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Missing credential, template or data
    Configuration,
    /// Network, timeout or bad status
    Transport,
    /// Malformed structured payload
    Decoding,
    /// Anything else raised while processing a response
    Unexpected,
    /// Local file or serialization problem
    Storage,
}

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("no configuration available")]
    MissingCredential,

    #[error("no prompt defined")]
    MissingPrompt,

    #[error("API error ({status}): {excerpt}...")]
    Status { status: u16, excerpt: String },

    #[error("connection error: {0}")]
    Transport(String),

    #[error("invalid response format")]
    InvalidEnvelope,

    #[error("empty response from API")]
    EmptyResponse,

    #[error("response was not valid JSON: {0}")]
    Decoding(String),

    #[error("error processing response: {message}")]
    Unexpected { message: String, raw: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ForgeError {
    pub fn kind(&self) -> FaultKind {
        match self {
            ForgeError::MissingCredential | ForgeError::MissingPrompt => FaultKind::Configuration,
            ForgeError::Status { .. }
            | ForgeError::Transport(_)
            | ForgeError::InvalidEnvelope
            | ForgeError::EmptyResponse => FaultKind::Transport,
            ForgeError::Decoding(_) => FaultKind::Decoding,
            ForgeError::Unexpected { .. } => FaultKind::Unexpected,
            ForgeError::IoError(_) | ForgeError::SerdeError(_) | ForgeError::TomlError(_) => {
                FaultKind::Storage
            }
        }
    }

    /// Raw service text attached to the failure, if any
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ForgeError::Unexpected { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
