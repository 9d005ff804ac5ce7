//! Events raised by a collection view and by its cells.

use rover_bridge::Topic;

pub const SELECT: &str = "select";
pub const SCROLL: &str = "scroll";
pub const REFRESH: &str = "refresh";
pub const ITEMS_CHANGED: &str = "change:items";
pub const FIRST_VISIBLE_INDEX_CHANGED: &str = "change:firstVisibleIndex";
pub const LAST_VISIBLE_INDEX_CHANGED: &str = "change:lastVisibleIndex";

pub const ITEM_CHANGED: &str = "change:item";
pub const ITEM_INDEX_CHANGED: &str = "change:itemIndex";

/// Native event the host must be told to report for a script topic, if any
pub fn native_event(topic: &str) -> Option<&'static str> {
    match topic {
        SELECT => Some("select"),
        REFRESH => Some("refresh"),
        SCROLL | FIRST_VISIBLE_INDEX_CHANGED | LAST_VISIBLE_INDEX_CHANGED => Some("scroll"),
        _ => None,
    }
}

/// Script topics that depend on the given native event
pub fn topics_for(native: &str) -> &'static [&'static str] {
    match native {
        "select" => &[SELECT],
        "refresh" => &[REFRESH],
        "scroll" => &[
            SCROLL,
            FIRST_VISIBLE_INDEX_CHANGED,
            LAST_VISIBLE_INDEX_CHANGED,
        ],
        _ => &[],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent<I> {
    Select { index: usize, item: Option<I> },
    Scroll { delta_x: f64, delta_y: f64 },
    Refresh,
    ItemsChanged,
    FirstVisibleIndexChanged(Option<i64>),
    LastVisibleIndexChanged(Option<i64>),
}

impl<I> Topic for ViewEvent<I> {
    fn topic(&self) -> &str {
        match self {
            ViewEvent::Select { .. } => SELECT,
            ViewEvent::Scroll { .. } => SCROLL,
            ViewEvent::Refresh => REFRESH,
            ViewEvent::ItemsChanged => ITEMS_CHANGED,
            ViewEvent::FirstVisibleIndexChanged(_) => FIRST_VISIBLE_INDEX_CHANGED,
            ViewEvent::LastVisibleIndexChanged(_) => LAST_VISIBLE_INDEX_CHANGED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellEvent<I> {
    /// The cell now shows a different item
    ItemChanged { index: usize, item: Option<I> },
    /// Same item, possibly at a new position
    IndexChanged { index: usize },
}

impl<I> Topic for CellEvent<I> {
    fn topic(&self) -> &str {
        match self {
            CellEvent::ItemChanged { .. } => ITEM_CHANGED,
            CellEvent::IndexChanged { .. } => ITEM_INDEX_CHANGED,
        }
    }
}
