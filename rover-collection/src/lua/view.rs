use crate::error::CollectionError;
use crate::events::ViewEvent;
use crate::kinds::DecodedKind;
use crate::lua::cell::LuaCell;
use crate::lua::config::CollectionConfig;
use crate::lua::helpers::{
    get_channel, get_properties, items_from_value, items_or_empty, optional_count,
    optional_index, positive_integer, required_index,
};
use crate::lua::value::ScriptValue;
use crate::lua::{ScriptCell, ScriptView};
use crate::resolve::{CellType, ItemHeight, Resolve};
use mlua::{FromLua, Function, IntoLua, Lua, MetaMethod, Result, UserData, UserDataMethods, Value};
use rover_bridge::{ListenerId, Topic};
use tracing::error;

/// Lua userdata for a collection view
#[derive(Clone)]
pub struct LuaCollectionView {
    view: ScriptView,
}

impl LuaCollectionView {
    pub fn new(view: ScriptView) -> Self {
        Self { view }
    }

    /// Build a list from `rover.collection { ... }` options
    pub fn create(lua: &Lua, config: CollectionConfig) -> Result<Self> {
        let channel = get_channel(lua)?;
        let this = Self::new(ScriptView::new(&channel));

        if !matches!(config.cell_type, Value::Nil) {
            this.set_cell_type(lua, config.cell_type)?;
        }
        if !matches!(config.item_height, Value::Nil) {
            this.set_item_height(lua, config.item_height)?;
        }
        if let Some(initializer) = config.initialize_cell {
            this.set_initialize_cell(lua, Value::Function(initializer))?;
        }
        if config.column_count != 1 {
            this.view.set_column_count(config.column_count)?;
        }
        if config.refresh_enabled {
            this.view.set_refresh_enabled(true);
        }
        if !config.refresh_message.is_empty() {
            this.view.set_refresh_message(config.refresh_message);
        }
        this.view.set_items(config.items);

        Ok(this)
    }

    fn get_property(&self, lua: &Lua, name: &str) -> Result<Value> {
        let view = &self.view;
        match name {
            "id" => view.id().to_string().into_lua(lua),
            "items" => lua.create_sequence_from(view.items())?.into_lua(lua),
            "cellType" => Ok(get_properties(lua)?.get(view.id(), "cellType")),
            "itemHeight" => match get_properties(lua)?.get(view.id(), "itemHeight") {
                Value::Nil => Ok(Value::Number(0.0)),
                height => Ok(height),
            },
            "initializeCell" => Ok(get_properties(lua)?.get(view.id(), "initializeCell")),
            "columnCount" => view.column_count().into_lua(lua),
            "refreshEnabled" => view.refresh_enabled().into_lua(lua),
            "refreshMessage" => view.refresh_message().into_lua(lua),
            "refreshIndicator" => view.refresh_indicator().into_lua(lua),
            "firstVisibleIndex" => view.first_visible_index().into_lua(lua),
            "lastVisibleIndex" => view.last_visible_index().into_lua(lua),
            _ => Ok(Value::Nil),
        }
    }

    fn set_property(&self, lua: &Lua, name: &str, value: Value) -> Result<()> {
        let view = &self.view;
        match name {
            "items" => view.set_items(items_or_empty(value)?),
            "cellType" => self.set_cell_type(lua, value)?,
            "itemHeight" => self.set_item_height(lua, value)?,
            "initializeCell" => self.set_initialize_cell(lua, value)?,
            "columnCount" => {
                let count = positive_integer(&value).ok_or_else(|| {
                    CollectionError::invalid("columnCount must be a positive integer")
                })?;
                view.set_column_count(count)?;
            }
            "refreshEnabled" => view.set_refresh_enabled(boolean(&value, name)?),
            "refreshMessage" => view.set_refresh_message(string(&value, name)?),
            "refreshIndicator" => view.set_refresh_indicator(boolean(&value, name)?),
            "firstVisibleIndex" => view.set_first_visible_index(optional_index(&value)?),
            "lastVisibleIndex" => view.set_last_visible_index(optional_index(&value)?),
            _ => {
                return Err(mlua::Error::RuntimeError(format!(
                    "Cannot set property '{}'",
                    name
                )));
            }
        }
        Ok(())
    }

    fn set_cell_type(&self, lua: &Lua, value: Value) -> Result<()> {
        let cell_type = match &value {
            Value::Function(f) => {
                let f = f.clone();
                CellType::computed(move |item: &ScriptValue| {
                    Ok(ScriptValue(f.call::<Value>(item.clone())?))
                })
            }
            kind => Resolve::Fixed(ScriptValue(kind.clone())),
        };
        self.view.set_cell_type(cell_type);
        get_properties(lua)?.set(self.view.id(), "cellType", value);
        Ok(())
    }

    fn set_item_height(&self, lua: &Lua, value: Value) -> Result<()> {
        let item_height = match &value {
            Value::Function(f) => {
                let f = f.clone();
                ItemHeight::computed(move |item: &ScriptValue, kind: &ScriptValue| {
                    Ok(f.call::<f64>((item.clone(), kind.clone()))?)
                })
            }
            Value::Integer(_) | Value::Number(_) => Resolve::Fixed(f64::from_lua(value.clone(), lua)?),
            _ => {
                return Err(
                    CollectionError::invalid("itemHeight must be a number or a function").into(),
                );
            }
        };
        self.view.set_item_height(item_height);
        get_properties(lua)?.set(self.view.id(), "itemHeight", value);
        Ok(())
    }

    fn set_initialize_cell(&self, lua: &Lua, value: Value) -> Result<()> {
        match &value {
            Value::Nil => self.view.clear_initialize_cell(),
            Value::Function(f) => {
                let f = f.clone();
                self.view.set_initialize_cell(
                    move |cell: &ScriptCell, kind: DecodedKind<ScriptValue>| {
                        let kind = kind.known().unwrap_or_default();
                        if let Err(err) = f.call::<()>((LuaCell::new(cell.clone()), kind)) {
                            error!("initializeCell failed for {}: {}", cell.id(), err);
                        }
                    },
                );
            }
            _ => return Err(CollectionError::invalid("initializeCell must be a function").into()),
        }
        get_properties(lua)?.set(self.view.id(), "initializeCell", value);
        Ok(())
    }
}

fn boolean(value: &Value, name: &str) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        _ => Err(CollectionError::invalid(format!("{} must be a boolean", name)).into()),
    }
}

fn string(value: &Value, name: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.to_str()?.to_string()),
        _ => Err(CollectionError::invalid(format!("{} must be a string", name)).into()),
    }
}

impl UserData for LuaCollectionView {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // __index / __newindex: properties
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: String| {
            this.get_property(lua, &key)
        });

        methods.add_meta_method(
            MetaMethod::NewIndex,
            |lua, this, (key, value): (String, Value)| this.set_property(lua, &key, value),
        );

        methods.add_meta_method(MetaMethod::ToString, |_lua, this, ()| {
            Ok(format!("CollectionView({})", this.view.id()))
        });

        methods.add_method("get", |lua, this, name: String| this.get_property(lua, &name));

        methods.add_method("set", |lua, this, (name, value): (String, Value)| {
            this.set_property(lua, &name, value)
        });

        methods.add_method("insert", |_lua, this, (items, at): (Value, Value)| {
            let items = items_from_value(items)?;
            let at = optional_index(&at)?;
            this.view.insert(items, at);
            Ok(())
        });

        methods.add_method("remove", |_lua, this, (at, count): (Value, Value)| {
            let at = required_index(&at)?;
            let count = optional_count(&count)?;
            Ok(this.view.remove(at, count).is_some())
        });

        methods.add_method("refresh", |_lua, this, index: Value| {
            this.view.refresh(optional_index(&index)?);
            Ok(())
        });

        methods.add_method("reveal", |_lua, this, index: Value| {
            this.view.reveal(required_index(&index)?);
            Ok(())
        });

        // view:on(topic, fn(view, ...)) -> listener id
        methods.add_method("on", |_lua, this, (topic, callback): (String, Function)| {
            let id = this.view.on(&topic, move |view, event| {
                let view = LuaCollectionView::new(view.clone());
                let result = match event {
                    ViewEvent::Select { index, item } => {
                        callback.call::<()>((view, *index, item.clone()))
                    }
                    ViewEvent::Scroll { delta_x, delta_y } => {
                        callback.call::<()>((view, *delta_x, *delta_y))
                    }
                    ViewEvent::Refresh | ViewEvent::ItemsChanged => callback.call::<()>(view),
                    ViewEvent::FirstVisibleIndexChanged(index)
                    | ViewEvent::LastVisibleIndexChanged(index) => {
                        callback.call::<()>((view, *index))
                    }
                };
                if let Err(err) = result {
                    error!("'{}' listener failed: {}", event.topic(), err);
                }
            });
            Ok(id.0)
        });

        methods.add_method("off", |_lua, this, id: u64| Ok(this.view.off(ListenerId(id))));

        methods.add_method("dispose", |lua, this, ()| {
            this.view.dispose();
            get_properties(lua)?.forget(this.view.id());
            Ok(())
        });
    }
}
