use crate::error::CollectionError;
use crate::items::{checked_count, checked_index};
use crate::lua::value::ScriptValue;
use mlua::{Lua, Result, Value};
use rover_bridge::{Channel, ProxyId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Raw Lua values behind properties that are stored as Rust closures
/// (`cellType`, `itemHeight`, `initializeCell`), so getters hand back what the script set.
#[derive(Clone, Default)]
pub struct ScriptProperties {
    values: Rc<RefCell<HashMap<(ProxyId, &'static str), Value>>>,
}

impl ScriptProperties {
    pub fn get(&self, id: ProxyId, name: &'static str) -> Value {
        self.values
            .borrow()
            .get(&(id, name))
            .cloned()
            .unwrap_or(Value::Nil)
    }

    pub fn set(&self, id: ProxyId, name: &'static str, value: Value) {
        self.values.borrow_mut().insert((id, name), value);
    }

    pub fn forget(&self, id: ProxyId) {
        self.values.borrow_mut().retain(|(owner, _), _| *owner != id);
    }
}

/// Get bridge channel from Lua app_data
pub fn get_channel(lua: &Lua) -> Result<Channel> {
    lua.app_data_ref::<Channel>()
        .ok_or_else(|| mlua::Error::RuntimeError("Bridge channel not initialized".into()))
        .map(|c| c.clone())
}

/// Get script property store from Lua app_data
pub fn get_properties(lua: &Lua) -> Result<ScriptProperties> {
    lua.app_data_ref::<ScriptProperties>()
        .ok_or_else(|| mlua::Error::RuntimeError("Script properties not initialized".into()))
        .map(|p| p.clone())
}

/// Items given as a Lua sequence
pub fn items_from_value(value: Value) -> Result<Vec<ScriptValue>> {
    match value {
        Value::Table(items) => items.sequence_values::<ScriptValue>().collect(),
        _ => Err(CollectionError::invalid("items must be a table").into()),
    }
}

/// Like [`items_from_value`], with nil meaning an empty list
pub fn items_or_empty(value: Value) -> Result<Vec<ScriptValue>> {
    match value {
        Value::Nil => Ok(Vec::new()),
        items => items_from_value(items),
    }
}

/// Whole number of at least 1, as `columnCount` expects
pub fn positive_integer(value: &Value) -> Option<u32> {
    match *value {
        Value::Integer(n) => u32::try_from(n).ok().filter(|n| *n > 0),
        Value::Number(n) if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Some(n as u32),
        _ => None,
    }
}

fn number(value: &Value, what: &str) -> Result<Option<f64>> {
    match value {
        Value::Nil => Ok(None),
        Value::Integer(n) => Ok(Some(*n as f64)),
        Value::Number(n) => Ok(Some(*n)),
        _ => Err(CollectionError::invalid(format!("{} must be a number", what)).into()),
    }
}

/// Optional list index; nil means "not given"
pub fn optional_index(value: &Value) -> Result<Option<i64>> {
    number(value, "index")?
        .map(checked_index)
        .transpose()
        .map_err(Into::into)
}

pub fn required_index(value: &Value) -> Result<i64> {
    optional_index(value)?
        .ok_or_else(|| CollectionError::invalid("index must be a number").into())
}

pub fn optional_count(value: &Value) -> Result<Option<usize>> {
    number(value, "count")?
        .map(checked_count)
        .transpose()
        .map_err(Into::into)
}
