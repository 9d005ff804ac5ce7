use crate::channel::EventTarget;
use crate::{Name, ProxyId};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::rc::Rc;

/// One live proxy as seen by the bridge
pub struct ProxyEntry {
    type_name: Name,
    parent: Option<ProxyId>,
    children: SmallVec<[ProxyId; 8]>,
    target: Option<Rc<dyn EventTarget>>,
}

impl ProxyEntry {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn parent(&self) -> Option<ProxyId> {
        self.parent
    }

    pub fn children(&self) -> &[ProxyId] {
        &self.children
    }
}

/// Table of live proxies, used to resolve incoming events to their target object.
///
/// Ids are never recycled. An attached event target is owned by the registry until the proxy
/// is disposed, so a proxy outlives the script handles that created it.
pub struct ProxyRegistry {
    entries: HashMap<ProxyId, ProxyEntry>,
    next: u32,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            // The first proxy is `$1`
            next: 1,
        }
    }

    pub fn create(&mut self, type_name: &str, parent: Option<ProxyId>) -> ProxyId {
        let id = ProxyId(self.next);
        self.next += 1;
        if let Some(parent) = parent.and_then(|parent| self.entries.get_mut(&parent)) {
            parent.children.push(id);
        }
        self.entries.insert(
            id,
            ProxyEntry {
                type_name: type_name.into(),
                parent,
                children: SmallVec::new(),
                target: None,
            },
        );
        id
    }

    /// Route events for `id` to `target`. Returns false if the proxy is not live.
    pub fn attach_target(&mut self, id: ProxyId, target: Rc<dyn EventTarget>) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.target = Some(target);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ProxyId) -> Option<&ProxyEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ProxyId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Resolve the object an event for `id` should be delivered to
    pub fn target(&self, id: ProxyId) -> Option<Rc<dyn EventTarget>> {
        self.get(id)?.target.clone()
    }

    pub fn parent(&self, id: ProxyId) -> Option<ProxyId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: ProxyId) -> SmallVec<[ProxyId; 8]> {
        self.get(id)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    /// Remove a proxy and its descendants. Returns the removed entries, parent first, so the
    /// caller decides when their targets are dropped.
    pub fn dispose(&mut self, id: ProxyId) -> Vec<(ProxyId, ProxyEntry)> {
        let Some(entry) = self.entries.remove(&id) else {
            return Vec::new();
        };
        if let Some(parent) = entry.parent.and_then(|parent| self.entries.get_mut(&parent)) {
            parent.children.retain(|child| *child != id);
        }

        let mut removed = vec![(id, entry)];
        let mut cursor = 0;
        while cursor < removed.len() {
            let children = removed[cursor].1.children.clone();
            for child in children {
                if let Some(entry) = self.entries.remove(&child) {
                    removed.push((child, entry));
                }
            }
            cursor += 1;
        }
        removed
    }

    /// Drop every attached target, leaving the proxies registered
    pub fn detach_all(&mut self) -> Vec<Rc<dyn EventTarget>> {
        self.entries
            .values_mut()
            .filter_map(|entry| entry.target.take())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
