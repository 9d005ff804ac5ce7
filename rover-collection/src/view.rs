//! The collection view proxy: item sequence, recycled cells and the host conversation that
//! keeps both sides in step.

use crate::cells::{Cell, CellChange, CellPool};
use crate::error::{
    CollectionError, ConfigurationWarning, Diagnostic, ProtocolInconsistency, Result,
};
use crate::events::{self, CellEvent, ViewEvent};
use crate::flush::FlushCoordinator;
use crate::items::{ItemStore, Splice};
use crate::kinds::{DecodedKind, KindTable};
use crate::resolve::{CellType, ItemHeight, Resolve, TypeResolver};
use rover_bridge::{
    BridgeError, Channel, Emitter, EventTarget, FlushTarget, ListenerId, NativeEvent, ProxyId,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

pub const TYPE_NAME: &str = "rover.CollectionView";
pub const CELL_TYPE_NAME: &str = "rover.Cell";

/// Events the list always needs from the host to drive its cells
const HOST_EVENTS: [&str; 3] = ["requestinfo", "createitem", "populateitem"];

/// Diagnostics kept per list; the oldest are dropped first
pub const MAX_DIAGNOSTICS: usize = 256;

/// Values a list can hold
pub trait Item: Clone + PartialEq + 'static {}
impl<T: Clone + PartialEq + 'static> Item for T {}

/// Cell kinds. The default kind answers requests the list cannot resolve.
pub trait Kind: Clone + PartialEq + Default + 'static {}
impl<T: Clone + PartialEq + Default + 'static> Kind for T {}

pub type CellInitializer<I, K> = Rc<dyn Fn(&CellRef<I, K>, DecodedKind<K>)>;

type ViewEmitter<I, K> = Emitter<CollectionView<I, K>, ViewEvent<I>>;
type CellEmitter<I, K> = Rc<Emitter<CellRef<I, K>, CellEvent<I>>>;

#[derive(Deserialize)]
struct RequestInfo {
    index: usize,
}

#[derive(Deserialize)]
struct CreateItem {
    #[serde(rename = "type")]
    kind: u32,
}

#[derive(Deserialize)]
struct PopulateItem {
    widget: ProxyId,
    index: usize,
}

#[derive(Deserialize)]
struct Select {
    index: usize,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Scroll {
    delta_x: f64,
    delta_y: f64,
}

struct ViewState<I, K> {
    items: ItemStore<I>,
    cells: CellPool<I>,
    kinds: KindTable<K>,
    resolver: TypeResolver<I, K>,
    flush: FlushCoordinator,
    initialize_cell: Option<CellInitializer<I, K>>,
    column_count: u32,
    refresh_enabled: bool,
    refresh_message: String,
    first_visible: Option<i64>,
    last_visible: Option<i64>,
    diagnostics: VecDeque<Diagnostic>,
    disposed: bool,
}

struct Inner<I, K> {
    me: Weak<Inner<I, K>>,
    id: ProxyId,
    channel: Channel,
    state: RefCell<ViewState<I, K>>,
    events: ViewEmitter<I, K>,
    cell_events: RefCell<HashMap<ProxyId, CellEmitter<I, K>>>,
}

/// Script-side handle on a native collection view. Clones share the same list.
pub struct CollectionView<I, K> {
    inner: Rc<Inner<I, K>>,
}

impl<I, K> Clone for CollectionView<I, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<I: Item, K: Kind> CollectionView<I, K> {
    /// Create the native list and register it for host events and end-of-turn flushes
    pub fn new(channel: &Channel) -> Self {
        let id = channel.create(TYPE_NAME, None, Map::new());
        for event in HOST_EVENTS {
            channel.listen(id, event, true);
        }

        let inner = Rc::new_cyclic(|me| Inner {
            me: me.clone(),
            id,
            channel: channel.clone(),
            state: RefCell::new(ViewState {
                items: ItemStore::new(),
                cells: CellPool::new(),
                kinds: KindTable::new(),
                resolver: TypeResolver::new(),
                flush: FlushCoordinator::new(),
                initialize_cell: None,
                column_count: 1,
                refresh_enabled: false,
                refresh_message: String::new(),
                first_visible: None,
                last_visible: None,
                diagnostics: VecDeque::new(),
                disposed: false,
            }),
            events: Emitter::new(),
            cell_events: RefCell::new(HashMap::new()),
        });

        // The channel owns the list until it is disposed
        channel.attach(id, inner.clone());
        channel.on_flush(id, inner.clone());
        debug!("created {} {}", TYPE_NAME, id);

        Self { inner }
    }

    pub fn id(&self) -> ProxyId {
        self.inner.id
    }

    pub fn channel(&self) -> &Channel {
        &self.inner.channel
    }

    fn state(&self) -> Ref<'_, ViewState<I, K>> {
        self.inner.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, ViewState<I, K>> {
        self.inner.state.borrow_mut()
    }

    pub fn items(&self) -> Vec<I> {
        self.state().items.as_slice().to_vec()
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().items.is_empty()
    }

    /// Item at a possibly negative index
    pub fn item(&self, index: i64) -> Option<I> {
        let state = self.state();
        let position = state.items.position(index)?;
        state.items.get(position).cloned()
    }

    /// Replace the whole sequence. The host is told once, when the turn ends.
    pub fn set_items(&self, items: Vec<I>) {
        {
            let mut state = self.state_mut();
            state.items.replace_all(items);
            state.flush.mark_reload();
        }
        self.emit(ViewEvent::ItemsChanged);
    }

    pub fn reload_pending(&self) -> bool {
        self.state().flush.is_pending()
    }

    /// Splice items in before `at`, appending when `None`
    pub fn insert(&self, items: Vec<I>, at: Option<i64>) -> Splice {
        let splice = {
            let mut state = self.state_mut();
            let splice = state.items.insert(items, at);
            state.cells.shift(splice.at, splice.count as isize);
            splice
        };
        self.native_call("update", json!({ "insert": [splice.at, splice.count] }));
        splice
    }

    /// Remove `count` items (one when `None`) at `at`. Returns `None` when nothing changed.
    pub fn remove(&self, at: i64, count: Option<usize>) -> Option<Splice> {
        let splice = {
            let mut state = self.state_mut();
            let splice = state.items.remove(at, count)?;
            state
                .cells
                .shift(splice.at + splice.count, -(splice.count as isize));
            splice
        };
        self.native_call("update", json!({ "remove": [splice.at, splice.count] }));
        Some(splice)
    }

    /// Ask the host to re-populate one visible item, or all of them when `None`
    pub fn refresh(&self, index: Option<i64>) {
        match index {
            Some(index) => self.refresh_one(index),
            None => self.refresh_all(),
        }
    }

    pub fn refresh_all(&self) {
        let len = self.len();
        self.native_call("update", json!({ "reload": [0, len] }));
    }

    pub fn refresh_one(&self, index: i64) {
        let position = self.state().items.position(index);
        if let Some(position) = position {
            self.native_call("update", json!({ "reload": [position, 1] }));
        }
    }

    /// Scroll the host so the item becomes visible
    pub fn reveal(&self, index: i64) {
        let position = self.state().items.position(index);
        if let Some(position) = position {
            self.native_call("reveal", json!({ "index": position }));
        }
    }

    pub fn cell_type(&self) -> CellType<I, K> {
        self.state().resolver.cell_type().clone()
    }

    pub fn set_cell_type(&self, cell_type: CellType<I, K>) {
        self.state_mut().resolver.set_cell_type(cell_type);
    }

    pub fn item_height(&self) -> ItemHeight<I, K> {
        self.state().resolver.item_height().clone()
    }

    /// A fixed height is also mirrored on the native list
    pub fn set_item_height(&self, item_height: ItemHeight<I, K>) {
        let fixed = item_height.fixed().copied();
        self.state_mut().resolver.set_item_height(item_height);
        if let Some(height) = fixed {
            self.native_set("itemHeight", json!(height));
        }
    }

    pub fn set_initialize_cell(&self, initializer: impl Fn(&CellRef<I, K>, DecodedKind<K>) + 'static) {
        self.state_mut().initialize_cell = Some(Rc::new(initializer));
    }

    pub fn clear_initialize_cell(&self) {
        self.state_mut().initialize_cell = None;
    }

    pub fn has_initialize_cell(&self) -> bool {
        self.state().initialize_cell.is_some()
    }

    pub fn column_count(&self) -> u32 {
        self.state().column_count
    }

    pub fn set_column_count(&self, column_count: u32) -> Result<()> {
        if column_count == 0 {
            return Err(CollectionError::invalid("columnCount must be a positive integer"));
        }
        self.state_mut().column_count = column_count;
        self.native_set("columnCount", json!(column_count));
        Ok(())
    }

    pub fn refresh_enabled(&self) -> bool {
        self.state().refresh_enabled
    }

    pub fn set_refresh_enabled(&self, enabled: bool) {
        self.state_mut().refresh_enabled = enabled;
        self.native_set("refreshEnabled", json!(enabled));
    }

    pub fn refresh_message(&self) -> String {
        self.state().refresh_message.clone()
    }

    pub fn set_refresh_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.native_set("refreshMessage", json!(message));
        self.state_mut().refresh_message = message;
    }

    /// Whether the host currently shows the pull-to-refresh spinner
    pub fn refresh_indicator(&self) -> bool {
        self.channel()
            .get(self.id(), "refreshIndicator")
            .as_bool()
            .unwrap_or(false)
    }

    pub fn set_refresh_indicator(&self, visible: bool) {
        self.native_set("refreshIndicator", json!(visible));
    }

    pub fn first_visible_index(&self) -> Option<i64> {
        self.channel().get(self.id(), "firstVisibleIndex").as_i64()
    }

    pub fn last_visible_index(&self) -> Option<i64> {
        self.channel().get(self.id(), "lastVisibleIndex").as_i64()
    }

    /// Host-derived; the write is reported and ignored
    pub fn set_first_visible_index(&self, _index: Option<i64>) {
        self.diagnose(ConfigurationWarning::ReadOnlyProperty("firstVisibleIndex"));
    }

    pub fn set_last_visible_index(&self, _index: Option<i64>) {
        self.diagnose(ConfigurationWarning::ReadOnlyProperty("lastVisibleIndex"));
    }

    pub fn on(&self, topic: &str, listener: impl Fn(&Self, &ViewEvent<I>) + 'static) -> ListenerId {
        let native = events::native_event(topic);
        let first = native.is_some_and(|native| !self.listens_to(native));
        let id = self.inner.events.on(topic, listener);
        if let (true, Some(native)) = (first, native) {
            self.native_listen(native, true);
        }
        id
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let Some(topic) = self.inner.events.off(id) else {
            return false;
        };
        if let Some(native) = events::native_event(&topic) {
            if !self.listens_to(native) {
                self.native_listen(native, false);
            }
        }
        true
    }

    /// Whether any script topic still needs the native event
    fn listens_to(&self, native: &str) -> bool {
        events::topics_for(native)
            .iter()
            .any(|topic| self.inner.events.has_listeners(topic))
    }

    fn emit(&self, event: ViewEvent<I>) {
        self.inner.events.emit(self, &event);
    }

    pub fn cell(&self, id: ProxyId) -> Option<CellRef<I, K>> {
        self.state().cells.get(id).map(|_| self.cell_ref(id))
    }

    pub fn cells(&self) -> Vec<CellRef<I, K>> {
        let ids = self.state().cells.ids();
        ids.into_iter().map(|id| self.cell_ref(id)).collect()
    }

    fn cell_ref(&self, id: ProxyId) -> CellRef<I, K> {
        CellRef {
            view: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Recorded warnings and protocol inconsistencies, oldest first
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.state().diagnostics.iter().cloned().collect()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.state_mut().diagnostics).into()
    }

    fn diagnose(&self, diagnostic: impl Into<Diagnostic>) {
        let diagnostic = diagnostic.into();
        warn!("{} {}: {}", TYPE_NAME, self.id(), diagnostic);
        let mut state = self.state_mut();
        if state.diagnostics.len() == MAX_DIAGNOSTICS {
            state.diagnostics.pop_front();
        }
        state.diagnostics.push_back(diagnostic);
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    /// Destroy the native list with its cells and drop every script callback
    pub fn dispose(&self) {
        {
            let mut state = self.state_mut();
            if std::mem::replace(&mut state.disposed, true) {
                return;
            }
            state.cells.clear();
            state.initialize_cell = None;
            state.resolver = TypeResolver::new();
        }
        let removed = self.channel().destroy(self.id());
        debug!("disposed {} ({} proxies)", self.id(), removed.len());
        self.inner.cell_events.borrow_mut().clear();
        self.inner.events.clear();
    }

    fn native_set(&self, name: &str, value: Value) {
        if !self.is_disposed() {
            self.channel().set(self.id(), name, value);
        }
    }

    fn native_call(&self, method: &str, params: Value) {
        if !self.is_disposed() {
            self.channel().call(self.id(), method, params);
        }
    }

    fn native_listen(&self, event: &str, listen: bool) {
        if !self.is_disposed() {
            self.channel().listen(self.id(), event, listen);
        }
    }

    fn handle_event(&self, event: &NativeEvent) -> rover_bridge::Result<()> {
        match event.name.as_str() {
            "requestinfo" => {
                let RequestInfo { index } = self.parse(event)?;
                self.describe_item(index)
                    .map_err(|err| handler_error(event, err))
            }
            "createitem" => {
                let CreateItem { kind } = self.parse(event)?;
                self.create_item(kind);
                Ok(())
            }
            "populateitem" => {
                let PopulateItem { widget, index } = self.parse(event)?;
                self.populate_item(widget, index);
                Ok(())
            }
            "select" => {
                let Select { index } = self.parse(event)?;
                let item = self.state().items.get(index).cloned();
                self.emit(ViewEvent::Select { index, item });
                Ok(())
            }
            "scroll" => {
                let Scroll { delta_x, delta_y } = self.parse(event)?;
                self.emit(ViewEvent::Scroll { delta_x, delta_y });
                self.track_visible_indices();
                Ok(())
            }
            "refresh" => {
                self.emit(ViewEvent::Refresh);
                Ok(())
            }
            _ => Err(BridgeError::UnhandledEvent {
                target: self.id(),
                event: event.name.clone(),
            }),
        }
    }

    fn parse<T: DeserializeOwned>(&self, event: &NativeEvent) -> rover_bridge::Result<T> {
        event.parse().inspect_err(|err| {
            if let BridgeError::MalformedEvent { event, reason } = err {
                self.diagnose(ProtocolInconsistency::MalformedEvent {
                    event: event.to_string(),
                    reason: reason.clone(),
                });
            }
        })
    }

    /// Answer `requestinfo`: which kind of cell shows the item and how tall it is
    fn describe_item(&self, index: usize) -> Result<()> {
        let (item, resolver, len) = {
            let state = self.state();
            let item = state.items.get(index).cloned();
            (item, state.resolver.clone(), state.items.len())
        };

        let (kind, height) = match item {
            Some(item) => {
                let kind = resolver.resolve_kind(&item)?;
                let height = resolver.resolve_height(&item, &kind)?;
                (kind, height)
            }
            None => {
                self.diagnose(ProtocolInconsistency::IndexOutOfRange { index, len });
                let height = match resolver.item_height() {
                    Resolve::Fixed(height) => *height,
                    Resolve::Computed(_) => 0.0,
                };
                (K::default(), height)
            }
        };

        let kind_id = self.state_mut().kinds.encode(kind);
        self.native_call(
            "describeItem",
            json!({ "index": index, "type": kind_id, "height": height }),
        );
        Ok(())
    }

    /// Answer `createitem`: materialize a cell for the host to recycle
    fn create_item(&self, kind_id: u32) {
        let cell = self
            .channel()
            .create(CELL_TYPE_NAME, Some(self.id()), Map::new());
        let (kind, initializer) = {
            let mut state = self.state_mut();
            state.cells.materialize(cell, kind_id);
            (state.kinds.decode(kind_id), state.initialize_cell.clone())
        };
        self.inner
            .cell_events
            .borrow_mut()
            .insert(cell, Rc::new(Emitter::new()));
        self.native_call("addItem", json!({ "widget": cell }));

        if let DecodedKind::Unknown(id) = kind {
            self.diagnose(ProtocolInconsistency::UnknownKind(id));
        }
        match initializer {
            Some(initializer) => initializer(&self.cell_ref(cell), kind),
            None => self.diagnose(ConfigurationWarning::MissingCellInitializer),
        }
    }

    /// Answer `populateitem`: bind the item at `index` to a recycled cell
    fn populate_item(&self, widget: ProxyId, index: usize) {
        let (populated, len) = {
            let mut state = self.state_mut();
            let item = state.items.get(index).cloned();
            let len = state.items.len();
            let populated = state
                .cells
                .populate(widget, index, item.clone())
                .map(|change| (change, item));
            (populated, len)
        };

        let (change, item) = match populated {
            Ok(populated) => populated,
            Err(inconsistency) => {
                self.diagnose(inconsistency);
                return;
            }
        };
        if index >= len {
            self.diagnose(ProtocolInconsistency::IndexOutOfRange { index, len });
        }

        let event = match change {
            CellChange::Item => CellEvent::ItemChanged { index, item },
            CellChange::Index => CellEvent::IndexChanged { index },
        };
        let emitter = self.inner.cell_events.borrow().get(&widget).cloned();
        if let Some(emitter) = emitter {
            emitter.emit(&self.cell_ref(widget), &event);
        }
    }

    /// Derive the visible index change events from a native scroll
    fn track_visible_indices(&self) {
        if self.inner.events.has_listeners(events::FIRST_VISIBLE_INDEX_CHANGED) {
            let index = self.first_visible_index();
            let previous = std::mem::replace(&mut self.state_mut().first_visible, index);
            if previous != index {
                self.emit(ViewEvent::FirstVisibleIndexChanged(index));
            }
        }
        if self.inner.events.has_listeners(events::LAST_VISIBLE_INDEX_CHANGED) {
            let index = self.last_visible_index();
            let previous = std::mem::replace(&mut self.state_mut().last_visible, index);
            if previous != index {
                self.emit(ViewEvent::LastVisibleIndexChanged(index));
            }
        }
    }

    /// End-of-turn: send the single coalesced reload if one is owed
    fn flush(&self) {
        let reload = {
            let mut state = self.state_mut();
            state.flush.take_reload().then(|| state.items.len())
        };
        if let Some(len) = reload {
            debug!("{} reload {} item(s)", self.id(), len);
            self.native_call("reload", json!({ "items": len }));
        }
    }
}

fn handler_error(event: &NativeEvent, err: CollectionError) -> BridgeError {
    match err {
        CollectionError::Bridge(err) => err,
        other => BridgeError::Handler {
            event: event.name.clone(),
            message: other.to_string(),
        },
    }
}

impl<I: Item, K: Kind> EventTarget for Inner<I, K> {
    fn handle_event(&self, event: &NativeEvent) -> rover_bridge::Result<()> {
        match self.me.upgrade() {
            Some(inner) => CollectionView { inner }.handle_event(event),
            None => Err(BridgeError::UnknownTarget(self.id)),
        }
    }
}

impl<I: Item, K: Kind> FlushTarget for Inner<I, K> {
    fn flush(&self) {
        if let Some(inner) = self.me.upgrade() {
            CollectionView { inner }.flush();
        }
    }
}

/// Handle on one cell of a list. It does not keep the list alive.
pub struct CellRef<I, K> {
    view: Weak<Inner<I, K>>,
    id: ProxyId,
}

impl<I, K> Clone for CellRef<I, K> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            id: self.id,
        }
    }
}

impl<I: Item, K: Kind> CellRef<I, K> {
    pub fn id(&self) -> ProxyId {
        self.id
    }

    pub fn view(&self) -> Option<CollectionView<I, K>> {
        self.view.upgrade().map(|inner| CollectionView { inner })
    }

    fn with_cell<R>(&self, f: impl FnOnce(&Cell<I>) -> R) -> Option<R> {
        let inner = self.view.upgrade()?;
        let state = inner.state.borrow();
        state.cells.get(self.id).map(f)
    }

    pub fn item_index(&self) -> Option<usize> {
        self.with_cell(Cell::item_index).flatten()
    }

    pub fn item(&self) -> Option<I> {
        self.with_cell(|cell| cell.item().cloned()).flatten()
    }

    pub fn kind_id(&self) -> Option<u32> {
        self.with_cell(Cell::kind_id)
    }

    pub fn kind(&self) -> Option<K> {
        let kind_id = self.kind_id()?;
        let inner = self.view.upgrade()?;
        let state = inner.state.borrow();
        state.kinds.decode(kind_id).known()
    }

    pub fn on(
        &self,
        topic: &str,
        listener: impl Fn(&CellRef<I, K>, &CellEvent<I>) + 'static,
    ) -> Option<ListenerId> {
        let inner = self.view.upgrade()?;
        let emitter = inner.cell_events.borrow().get(&self.id).cloned()?;
        Some(emitter.on(topic, listener))
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let Some(inner) = self.view.upgrade() else {
            return false;
        };
        let emitter = inner.cell_events.borrow().get(&self.id).cloned();
        emitter.is_some_and(|emitter| emitter.off(id).is_some())
    }
}
