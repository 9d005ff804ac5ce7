use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity shared by a script-side proxy and its native counterpart.
///
/// Ids are handed out by the [`ProxyRegistry`](crate::ProxyRegistry) and never reused, so a
/// late event that references a destroyed proxy can never reach a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyId(pub(crate) u32);

impl ProxyId {
    /// Rebuild an id received from the host.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}
