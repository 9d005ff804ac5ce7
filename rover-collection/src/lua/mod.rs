//! Lua surface: `rover.collection { ... }` and the view and cell userdata it hands out.

pub mod cell;
pub mod config;
pub mod helpers;
pub mod value;
pub mod view;

use crate::view::{CellRef, CollectionView};
use config::CollectionConfig;
use helpers::ScriptProperties;
use mlua::{Lua, Result, Table};
use value::ScriptValue;
use view::LuaCollectionView;

pub type ScriptView = CollectionView<ScriptValue, ScriptValue>;
pub type ScriptCell = CellRef<ScriptValue, ScriptValue>;

/// Register the collection module with Lua (adds rover.collection).
///
/// Expects a [`rover_bridge::Channel`] in the Lua app_data.
pub fn register_collection_module(lua: &Lua, rover_table: &Table) -> Result<()> {
    if lua.app_data_ref::<ScriptProperties>().is_none() {
        lua.set_app_data(ScriptProperties::default());
    }

    // rover.collection { items, cellType, itemHeight, initializeCell, ... }
    let collection_fn = lua.create_function(|lua, config: CollectionConfig| {
        LuaCollectionView::create(lua, config)
    })?;
    rover_table.set("collection", collection_fn)?;

    Ok(())
}
