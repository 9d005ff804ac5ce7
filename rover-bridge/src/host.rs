use crate::{Command, Host, ProxyId};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use tracing::error;

type PropertyTable = Rc<RefCell<HashMap<(ProxyId, String), Value>>>;

/// Host that records every delivered command, for tests and debugging.
///
/// Property reads are answered from a shared table the test fills in; unknown properties
/// read as `null`.
pub struct RecordingHost {
    log: Rc<RefCell<Vec<Command>>>,
    properties: PropertyTable,
    batches: Rc<RefCell<Vec<usize>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::with_buffer(Rc::new(RefCell::new(Vec::new())))
    }

    /// Create a RecordingHost writing into an existing log buffer
    pub fn with_buffer(log: Rc<RefCell<Vec<Command>>>) -> Self {
        Self {
            log,
            properties: Rc::new(RefCell::new(HashMap::new())),
            batches: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn log(&self) -> Rc<RefCell<Vec<Command>>> {
        self.log.clone()
    }

    pub fn properties(&self) -> PropertyTable {
        self.properties.clone()
    }

    /// Size of every batch received so far
    pub fn batches(&self) -> Rc<RefCell<Vec<usize>>> {
        self.batches.clone()
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for RecordingHost {
    fn receive(&mut self, commands: &[Command]) {
        self.batches.borrow_mut().push(commands.len());
        self.log.borrow_mut().extend_from_slice(commands);
    }

    fn get(&mut self, target: ProxyId, property: &str) -> Value {
        self.properties
            .borrow()
            .get(&(target, property.to_string()))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Host that writes each command as one JSON line.
///
/// Reads are answered from the last value the script itself set on that property.
pub struct JsonLinesHost<W: Write> {
    out: W,
    mirror: HashMap<(ProxyId, String), Value>,
}

impl<W: Write> JsonLinesHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            mirror: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Host for JsonLinesHost<W> {
    fn receive(&mut self, commands: &[Command]) {
        for command in commands {
            if let Command::Set { target, properties } = command {
                for (name, value) in properties {
                    self.mirror.insert((*target, name.clone()), value.clone());
                }
            }
            let written = serde_json::to_string(command)
                .map_err(std::io::Error::from)
                .and_then(|line| writeln!(self.out, "{line}"));
            if let Err(e) = written {
                error!("failed to write command for {}: {}", command.target(), e);
            }
        }
        if let Err(e) = self.out.flush() {
            error!("failed to flush host output: {}", e);
        }
    }

    fn get(&mut self, target: ProxyId, property: &str) -> Value {
        self.mirror
            .get(&(target, property.to_string()))
            .cloned()
            .unwrap_or(Value::Null)
    }
}
