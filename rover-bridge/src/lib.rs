//! Script-side half of the rover native bridge.
//!
//! Proxies are script objects mirrored by a widget on the native host. Every state change
//! is buffered as a [`Command`] on the [`Channel`] and delivered to the [`Host`] at the end of
//! a logic turn; everything the host reports back arrives as a [`NativeEvent`] and is routed
//! through the [`ProxyRegistry`] to the proxy it targets.

mod channel;
mod command;
mod emitter;
mod error;
mod event;
mod host;
mod proxy;
mod registry;

pub use channel::{Channel, EventTarget, FlushTarget, Host, TickReport};
pub use command::Command;
pub use emitter::{Emitter, ListenerId, Topic};
pub use error::{BridgeError, Result};
pub use event::{EventQueue, NativeEvent};
pub use host::{JsonLinesHost, RecordingHost};
pub use proxy::ProxyId;
pub use registry::{ProxyEntry, ProxyRegistry};

/// Compact string used for topics, event names and proxy type names.
pub type Name = smartstring::SmartString<smartstring::LazyCompact>;
