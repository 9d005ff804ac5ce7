use crate::{Name, ProxyId};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outgoing operation on a native widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Command {
    Create {
        target: ProxyId,
        #[serde(rename = "type")]
        type_name: Name,
        properties: Map<String, Value>,
    },
    Set {
        target: ProxyId,
        properties: Map<String, Value>,
    },
    Call {
        target: ProxyId,
        method: Name,
        params: Value,
    },
    Listen {
        target: ProxyId,
        event: Name,
        listen: bool,
    },
    Destroy {
        target: ProxyId,
    },
}

impl Command {
    pub fn set(target: ProxyId, name: &str, value: Value) -> Self {
        let mut properties = Map::new();
        properties.insert(name.to_string(), value);
        Command::Set { target, properties }
    }

    pub fn call(target: ProxyId, method: &str, params: Value) -> Self {
        Command::Call {
            target,
            method: method.into(),
            params,
        }
    }

    pub fn listen(target: ProxyId, event: &str, listen: bool) -> Self {
        Command::Listen {
            target,
            event: event.into(),
            listen,
        }
    }

    /// Proxy this command operates on
    pub fn target(&self) -> ProxyId {
        match self {
            Command::Create { target, .. }
            | Command::Set { target, .. }
            | Command::Call { target, .. }
            | Command::Listen { target, .. }
            | Command::Destroy { target } => *target,
        }
    }

    /// Method name for `call` commands
    pub fn method(&self) -> Option<&str> {
        match self {
            Command::Call { method, .. } => Some(method.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_wire_shape() {
        let cmd = Command::call(ProxyId(4), "update", json!({"insert": [1, 1]}));
        let wire = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            wire,
            json!({"op": "call", "target": 4, "method": "update", "params": {"insert": [1, 1]}})
        );
    }

    #[test]
    fn test_create_renames_type_field() {
        let cmd = Command::Create {
            target: ProxyId(1),
            type_name: "rover.Cell".into(),
            properties: Map::new(),
        };
        let wire = serde_json::to_value(&cmd).unwrap();
        assert_eq!(wire["op"], "create");
        assert_eq!(wire["type"], "rover.Cell");
    }

    #[test]
    fn test_accessors() {
        let listen = Command::listen(ProxyId(2), "select", true);
        assert_eq!(listen.target(), ProxyId(2));
        assert_eq!(listen.method(), None);

        let call = Command::call(ProxyId(9), "reload", json!({"items": 0}));
        assert_eq!(call.method(), Some("reload"));
    }
}
