use crate::{BridgeError, Command, EventQueue, NativeEvent, ProxyId, ProxyRegistry, Result};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Native side of the bridge.
///
/// Implementations receive batches of commands at the end of each logic turn and answer
/// synchronous property reads.
pub trait Host {
    fn receive(&mut self, commands: &[Command]);

    fn get(&mut self, target: ProxyId, property: &str) -> Value;
}

/// Script-side object that native events can be dispatched to
pub trait EventTarget {
    fn handle_event(&self, event: &NativeEvent) -> Result<()>;
}

/// Participant in the end-of-turn flush
pub trait FlushTarget {
    fn flush(&self);
}

/// Outcome of one [`Channel::tick`]
#[derive(Debug, Default)]
pub struct TickReport {
    pub dispatched: usize,
    pub errors: Vec<BridgeError>,
}

struct ChannelState {
    registry: ProxyRegistry,
    outbox: Vec<Command>,
    inbox: EventQueue,
    flush_targets: Vec<(ProxyId, Rc<dyn FlushTarget>)>,
    host: Box<dyn Host>,
}

/// Shared handle on the bridge: command buffer, proxy registry and inbound event queue.
///
/// Cloning is cheap; every proxy keeps its own clone.
#[derive(Clone)]
pub struct Channel {
    state: Rc<RefCell<ChannelState>>,
}

impl Channel {
    pub fn new(host: impl Host + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChannelState {
                registry: ProxyRegistry::new(),
                outbox: Vec::new(),
                inbox: EventQueue::new(),
                flush_targets: Vec::new(),
                host: Box::new(host),
            })),
        }
    }

    /// Register a new proxy and queue its native creation
    pub fn create(
        &self,
        type_name: &str,
        parent: Option<ProxyId>,
        properties: Map<String, Value>,
    ) -> ProxyId {
        let mut state = self.state.borrow_mut();
        let target = state.registry.create(type_name, parent);
        state.outbox.push(Command::Create {
            target,
            type_name: type_name.into(),
            properties,
        });
        target
    }

    pub fn set(&self, target: ProxyId, name: &str, value: Value) {
        self.send(Command::set(target, name, value));
    }

    pub fn call(&self, target: ProxyId, method: &str, params: Value) {
        self.send(Command::call(target, method, params));
    }

    pub fn listen(&self, target: ProxyId, event: &str, listen: bool) {
        self.send(Command::listen(target, event, listen));
    }

    /// Unregister a proxy with its descendants and queue its native destruction.
    ///
    /// The proxy's event and flush targets are released once the channel is no longer borrowed.
    pub fn destroy(&self, target: ProxyId) -> Vec<ProxyId> {
        let (removed, released) = {
            let mut state = self.state.borrow_mut();
            let removed = state.registry.dispose(target);
            if !removed.is_empty() {
                state.outbox.push(Command::Destroy { target });
            }
            let (released, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.flush_targets)
                .into_iter()
                .partition(|(owner, _)| removed.iter().any(|(id, _)| id == owner));
            state.flush_targets = kept;
            (removed, released)
        };
        drop(released);
        removed.into_iter().map(|(id, _)| id).collect()
    }

    /// Release every event and flush target while keeping the proxies registered.
    /// Breaks the ownership cycle between the channel and its proxies on teardown.
    pub fn detach_all(&self) {
        let released = {
            let mut state = self.state.borrow_mut();
            let flush = std::mem::take(&mut state.flush_targets);
            (state.registry.detach_all(), flush)
        };
        drop(released);
    }

    pub fn send(&self, command: Command) {
        trace!(?command, "queue");
        self.state.borrow_mut().outbox.push(command);
    }

    /// Synchronous native read. Buffered commands are delivered first so the host answers
    /// against the state the script has already described.
    pub fn get(&self, target: ProxyId, property: &str) -> Value {
        self.deliver();
        self.state.borrow_mut().host.get(target, property)
    }

    /// Route events for `target` to `handler`. The channel keeps it alive until the proxy is
    /// destroyed.
    pub fn attach(&self, target: ProxyId, handler: Rc<dyn EventTarget>) -> bool {
        self.state
            .borrow_mut()
            .registry
            .attach_target(target, handler)
    }

    /// Run `handler` at the end of every turn until `target` is destroyed
    pub fn on_flush(&self, target: ProxyId, handler: Rc<dyn FlushTarget>) {
        self.state.borrow_mut().flush_targets.push((target, handler));
    }

    pub fn contains(&self, target: ProxyId) -> bool {
        self.state.borrow().registry.contains(target)
    }

    pub fn parent(&self, target: ProxyId) -> Option<ProxyId> {
        self.state.borrow().registry.parent(target)
    }

    pub fn live_proxies(&self) -> usize {
        self.state.borrow().registry.len()
    }

    /// Commands queued since the last delivery
    pub fn outbox(&self) -> Vec<Command> {
        self.state.borrow().outbox.clone()
    }

    /// Queue an event from the host; it is dispatched on the next [`tick`](Self::tick)
    pub fn post(&self, event: NativeEvent) {
        self.state.borrow_mut().inbox.push(event);
    }

    pub fn pending_events(&self) -> usize {
        self.state.borrow().inbox.len()
    }

    /// Deliver one event to its target proxy right away
    pub fn dispatch(&self, event: &NativeEvent) -> Result<()> {
        let target = self.state.borrow().registry.target(event.target);
        match target {
            Some(target) => target.handle_event(event),
            None => Err(BridgeError::UnknownTarget(event.target)),
        }
    }

    /// Close the current logic turn: run flush participants, then hand the batch to the host
    pub fn end_turn(&self) {
        let targets: Vec<Rc<dyn FlushTarget>> = self
            .state
            .borrow()
            .flush_targets
            .iter()
            .map(|(_, target)| target.clone())
            .collect();
        for target in targets {
            target.flush();
        }
        self.deliver();
    }

    /// Dispatch every queued event, each in its own turn. With nothing queued a single turn
    /// is still closed so script-side changes reach the host.
    pub fn tick(&self) -> TickReport {
        let events: Vec<NativeEvent> = self.state.borrow_mut().inbox.drain().collect();
        let mut report = TickReport::default();

        if events.is_empty() {
            self.end_turn();
            return report;
        }

        for event in events {
            if let Err(err) = self.dispatch(&event) {
                warn!("{} '{}' dropped: {}", event.target, event.name, err);
                report.errors.push(err);
            }
            report.dispatched += 1;
            self.end_turn();
        }
        report
    }

    fn deliver(&self) {
        let mut state = self.state.borrow_mut();
        if state.outbox.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut state.outbox);
        debug!("delivering {} command(s)", batch.len());
        state.host.receive(&batch);
    }
}
