use crate::{BridgeError, Name, ProxyId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host-originated occurrence addressed to one proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEvent {
    pub target: ProxyId,
    pub name: Name,
    #[serde(default)]
    pub payload: Value,
}

impl NativeEvent {
    pub fn new(target: ProxyId, name: &str, payload: Value) -> Self {
        Self {
            target,
            name: name.into(),
            payload,
        }
    }

    /// Decode the payload into the shape the handler expects
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        let payload = match &self.payload {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(payload).map_err(|e| BridgeError::MalformedEvent {
            event: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// FIFO queue for inbound native events
#[derive(Debug)]
pub struct EventQueue {
    events: Vec<NativeEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to the back of the queue
    pub fn push(&mut self, event: NativeEvent) {
        self.events.push(event);
    }

    /// Drain all events from the queue in FIFO order
    pub fn drain(&mut self) -> impl Iterator<Item = NativeEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
