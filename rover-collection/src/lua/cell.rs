use crate::events::CellEvent;
use crate::lua::ScriptCell;
use crate::lua::view::LuaCollectionView;
use mlua::{Function, IntoLua, MetaMethod, UserData, UserDataMethods, Value};
use rover_bridge::{ListenerId, Topic};
use tracing::error;

/// Lua userdata for one recycled cell
#[derive(Clone)]
pub struct LuaCell {
    cell: ScriptCell,
}

impl LuaCell {
    pub fn new(cell: ScriptCell) -> Self {
        Self { cell }
    }
}

impl UserData for LuaCell {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: String| {
            let cell = &this.cell;
            match key.as_str() {
                "id" => cell.id().to_string().into_lua(lua),
                "item" => cell.item().into_lua(lua),
                "itemIndex" => cell.item_index().into_lua(lua),
                "type" => cell.kind().into_lua(lua),
                "view" => cell.view().map(LuaCollectionView::new).into_lua(lua),
                _ => Ok(Value::Nil),
            }
        });

        methods.add_meta_method(
            MetaMethod::NewIndex,
            |_lua, _this, (key, _value): (String, Value)| -> mlua::Result<()> {
                Err(mlua::Error::RuntimeError(format!(
                    "Cannot set property '{}'",
                    key
                )))
            },
        );

        methods.add_meta_method(MetaMethod::ToString, |_lua, this, ()| {
            Ok(format!("Cell({})", this.cell.id()))
        });

        // cell:on("change:item", fn(cell, item, index)) / cell:on("change:itemIndex", fn(cell, index))
        methods.add_method("on", |_lua, this, (topic, callback): (String, Function)| {
            let id = this.cell.on(&topic, move |cell, event| {
                let cell = LuaCell::new(cell.clone());
                let result = match event {
                    CellEvent::ItemChanged { index, item } => {
                        callback.call::<()>((cell, item.clone(), *index))
                    }
                    CellEvent::IndexChanged { index } => callback.call::<()>((cell, *index)),
                };
                if let Err(err) = result {
                    error!("'{}' listener failed: {}", event.topic(), err);
                }
            });
            Ok(id.map(|id| id.0))
        });

        methods.add_method("off", |_lua, this, id: u64| Ok(this.cell.off(ListenerId(id))));
    }
}
