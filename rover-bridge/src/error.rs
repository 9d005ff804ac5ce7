use crate::{Name, ProxyId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("No live proxy registered for {0}")]
    UnknownTarget(ProxyId),

    #[error("Proxy {target} does not handle '{event}' events")]
    UnhandledEvent { target: ProxyId, event: Name },

    #[error("Malformed '{event}' payload: {reason}")]
    MalformedEvent { event: Name, reason: String },

    #[error("Handler for '{event}' failed: {message}")]
    Handler { event: Name, message: String },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
