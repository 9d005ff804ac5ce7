/// Result of decoding a cell type id received from the host
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedKind<K> {
    Known(K),
    /// The host sent an id this list never encoded
    Unknown(u32),
}

impl<K> DecodedKind<K> {
    pub fn known(self) -> Option<K> {
        match self {
            DecodedKind::Known(kind) => Some(kind),
            DecodedKind::Unknown(_) => None,
        }
    }
}

/// Append-only table assigning each distinct cell kind a small integer id.
///
/// The wire protocol only carries the id. An id is fixed for the lifetime of the list, even
/// once the kind stops being produced.
#[derive(Debug, Clone)]
pub struct KindTable<K> {
    kinds: Vec<K>,
}

impl<K: PartialEq> KindTable<K> {
    pub fn new() -> Self {
        Self { kinds: Vec::new() }
    }

    pub fn encode(&mut self, kind: K) -> u32 {
        if let Some(id) = self.kinds.iter().position(|k| *k == kind) {
            return id as u32;
        }
        self.kinds.push(kind);
        (self.kinds.len() - 1) as u32
    }

    pub fn get(&self, id: u32) -> Option<&K> {
        self.kinds.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl<K: PartialEq + Clone> KindTable<K> {
    pub fn decode(&self, id: u32) -> DecodedKind<K> {
        match self.get(id) {
            Some(kind) => DecodedKind::Known(kind.clone()),
            None => DecodedKind::Unknown(id),
        }
    }
}

impl<K: PartialEq> Default for KindTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
