use rover_bridge::{BridgeError, ProxyId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),
}

impl CollectionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CollectionError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CollectionError>;

impl From<CollectionError> for mlua::Error {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::Lua(err) => err,
            other => mlua::Error::RuntimeError(other.to_string()),
        }
    }
}

/// Non-fatal misuse by the script; the operation continues degraded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationWarning {
    #[error("initializeCell callback missing")]
    MissingCellInitializer,

    #[error("Cannot set read-only property '{0}'")]
    ReadOnlyProperty(&'static str),
}

/// The host referenced something the list does not know about
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolInconsistency {
    #[error("unknown cell {0}")]
    UnknownCell(ProxyId),

    #[error("unknown cell type id {0}")]
    UnknownKind(u32),

    #[error("index {index} out of range for {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("malformed '{event}' event: {reason}")]
    MalformedEvent { event: String, reason: String },
}

/// Recorded on the list for every recoverable condition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error(transparent)]
    Warning(#[from] ConfigurationWarning),

    #[error(transparent)]
    Protocol(#[from] ProtocolInconsistency),
}
