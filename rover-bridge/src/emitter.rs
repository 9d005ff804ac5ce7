use crate::Name;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Emitter::on`], used to detach the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Events routed through an [`Emitter`] name the topic they belong to
pub trait Topic {
    fn topic(&self) -> &str;
}

type Callback<S, E> = Rc<dyn Fn(&S, &E)>;

struct Listener<S: ?Sized, E> {
    id: ListenerId,
    topic: Name,
    callback: Callback<S, E>,
}

/// Topic-keyed listener list owned by a proxy.
///
/// Listeners receive the emitting source and the event. Emission snapshots the matching
/// callbacks first, so a listener may attach or detach listeners (or emit again) while it runs.
pub struct Emitter<S: ?Sized, E> {
    listeners: RefCell<Vec<Listener<S, E>>>,
    next_id: Cell<u64>,
}

impl<S: ?Sized, E: Topic> Emitter<S, E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn on(&self, topic: &str, callback: impl Fn(&S, &E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            topic: topic.into(),
            callback: Rc::new(callback),
        });
        id
    }

    /// Detach a listener, returning the topic it was attached to
    pub fn off(&self, id: ListenerId) -> Option<Name> {
        let mut listeners = self.listeners.borrow_mut();
        let position = listeners.iter().position(|l| l.id == id)?;
        Some(listeners.remove(position).topic)
    }

    pub fn has_listeners(&self, topic: &str) -> bool {
        self.listener_count(topic) > 0
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.topic.as_str() == topic)
            .count()
    }

    /// Invoke every listener of the event's topic. Returns how many ran.
    pub fn emit(&self, source: &S, event: &E) -> usize {
        let callbacks: SmallVec<[Callback<S, E>; 4]> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.topic.as_str() == event.topic())
            .map(|l| l.callback.clone())
            .collect();

        for callback in &callbacks {
            callback(source, event);
        }
        callbacks.len()
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl<S: ?Sized, E: Topic> Default for Emitter<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
