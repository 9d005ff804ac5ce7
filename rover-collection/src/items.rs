//! Authoritative item sequence of a collection view.

use crate::error::{CollectionError, Result};

/// Contiguous range touched by a structural change, as reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splice {
    pub at: usize,
    pub count: usize,
}

/// Validate an index coming from script code. Fractions are truncated like a splice would.
pub fn checked_index(value: f64) -> Result<i64> {
    if !value.is_finite() {
        return Err(CollectionError::invalid("illegal index"));
    }
    Ok(value.trunc() as i64)
}

/// Validate a remove count coming from script code
pub fn checked_count(value: f64) -> Result<usize> {
    if !value.is_finite() || value < 0.0 {
        return Err(CollectionError::invalid("illegal remove count"));
    }
    Ok(value.trunc() as usize)
}

/// Ordered item sequence with indices always `[0, len)`
#[derive(Debug, Clone)]
pub struct ItemStore<I> {
    items: Vec<I>,
}

impl<I> ItemStore<I> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&I> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[I] {
        &self.items
    }

    pub fn replace_all(&mut self, items: Vec<I>) {
        self.items = items;
    }

    /// Negative indices count from the end
    pub fn normalize(&self, index: i64) -> i64 {
        if index < 0 {
            index.saturating_add(self.len() as i64)
        } else {
            index
        }
    }

    /// Normalized index, if it addresses an existing item
    pub fn position(&self, index: i64) -> Option<usize> {
        let index = self.normalize(index);
        (index >= 0 && (index as u64) < self.len() as u64).then_some(index as usize)
    }

    /// Splice `items` in before `at` (appending when `None`). The position is clamped into
    /// `[0, len]`.
    pub fn insert(&mut self, items: Vec<I>, at: Option<i64>) -> Splice {
        let len = self.len() as i64;
        let at = match at {
            None => len,
            Some(index) => self.normalize(index).clamp(0, len),
        } as usize;
        let count = items.len();
        self.items.splice(at..at, items);
        Splice { at, count }
    }

    /// Remove `count` items (one when `None`) starting at `at`. The count is clamped to the
    /// items available; an out-of-range `at` or an empty resulting range changes nothing.
    pub fn remove(&mut self, at: i64, count: Option<usize>) -> Option<Splice> {
        let at = self.normalize(at);
        let len = self.len() as i64;
        let count = match count {
            None => 1,
            Some(count) => i64::try_from(count).unwrap_or(i64::MAX).min(len.saturating_sub(at)),
        };
        if at < 0 || at >= len || count <= 0 {
            return None;
        }

        let (at, count) = (at as usize, count as usize);
        self.items.drain(at..at + count);
        Some(Splice { at, count })
    }
}

impl<I> Default for ItemStore<I> {
    fn default() -> Self {
        Self::new()
    }
}
