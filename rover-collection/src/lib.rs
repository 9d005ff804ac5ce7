//! Virtualized list for rover: a script-side item sequence kept in step with a small pool of
//! native cells the host recycles.
//!
//! The host asks for what it needs (`requestinfo`, `createitem`, `populateitem`); the list
//! answers through the [`rover_bridge::Channel`] and reports structural changes as they happen.
//! Wholesale item replacement is coalesced into one `reload` per logic turn.

pub mod cells;
pub mod error;
pub mod events;
pub mod flush;
pub mod items;
pub mod kinds;
pub mod lua;
pub mod resolve;
pub mod session;
pub mod view;

pub use cells::{Cell, CellChange, CellPool};
pub use error::{CollectionError, ConfigurationWarning, Diagnostic, ProtocolInconsistency, Result};
pub use events::{CellEvent, ViewEvent};
pub use flush::{FlushCoordinator, FlushState};
pub use items::{ItemStore, Splice};
pub use kinds::{DecodedKind, KindTable};
pub use lua::register_collection_module;
pub use resolve::{CellType, ItemHeight, Resolve, TypeResolver};
pub use session::ScriptSession;
pub use view::{CELL_TYPE_NAME, CellRef, CollectionView, MAX_DIAGNOSTICS, TYPE_NAME};
