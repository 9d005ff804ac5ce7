use crate::lua::helpers::{items_or_empty, positive_integer};
use crate::lua::value::ScriptValue;
use anyhow::anyhow;
use mlua::{FromLua, Function, Lua, Value};

/// Options accepted by `rover.collection { ... }`
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub items: Vec<ScriptValue>,
    /// Fixed kind or `function(item) -> kind`
    pub cell_type: Value,
    /// Fixed height or `function(item, kind) -> height`
    pub item_height: Value,
    pub initialize_cell: Option<Function>,
    pub column_count: u32,
    pub refresh_enabled: bool,
    pub refresh_message: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cell_type: Value::Nil,
            item_height: Value::Nil,
            initialize_cell: None,
            column_count: 1,
            refresh_enabled: false,
            refresh_message: String::new(),
        }
    }
}

impl FromLua for CollectionConfig {
    fn from_lua(value: Value, _lua: &Lua) -> mlua::Result<Self> {
        match value {
            Value::Nil => Ok(CollectionConfig::default()),
            Value::Table(config) => {
                let items = items_or_empty(config.get::<Value>("items")?)?;

                let item_height = match config.get::<Value>("itemHeight")? {
                    height @ (Value::Nil
                    | Value::Integer(_)
                    | Value::Number(_)
                    | Value::Function(_)) => height,
                    _ => Err(anyhow!("itemHeight must be a number or a function"))?,
                };

                let initialize_cell = match config.get::<Value>("initializeCell")? {
                    Value::Nil => None,
                    Value::Function(f) => Some(f),
                    _ => Err(anyhow!("initializeCell must be a function"))?,
                };

                let column_count = match config.get::<Value>("columnCount")? {
                    Value::Nil => 1,
                    count => match positive_integer(&count) {
                        Some(count) => count,
                        None => Err(anyhow!("columnCount must be a positive integer"))?,
                    },
                };

                let refresh_enabled = match config.get::<Value>("refreshEnabled")? {
                    Value::Nil => false,
                    Value::Boolean(b) => b,
                    _ => Err(anyhow!("refreshEnabled must be a boolean"))?,
                };

                let refresh_message = match config.get::<Value>("refreshMessage")? {
                    Value::Nil => String::new(),
                    Value::String(s) => s.to_str()?.to_string(),
                    _ => Err(anyhow!("refreshMessage must be a string"))?,
                };

                Ok(CollectionConfig {
                    items,
                    cell_type: config.get::<Value>("cellType")?,
                    item_height,
                    initialize_cell,
                    column_count,
                    refresh_enabled,
                    refresh_message,
                })
            }
            _ => Err(anyhow!("Collection config must be a table"))?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lua: &Lua, source: &str) -> mlua::Result<CollectionConfig> {
        let value: Value = lua.load(source).eval()?;
        CollectionConfig::from_lua(value, lua)
    }

    #[test]
    fn test_defaults() {
        let lua = Lua::new();
        let config = parse(&lua, "{}").unwrap();
        assert!(config.items.is_empty());
        assert_eq!(config.column_count, 1);
        assert!(!config.refresh_enabled);
        assert!(config.initialize_cell.is_none());
        assert!(matches!(config.cell_type, Value::Nil));
    }

    #[test]
    fn test_full_config() {
        let lua = Lua::new();
        let config = parse(
            &lua,
            r#"{
                items = { "a", "b", "c" },
                cellType = function(item) return item end,
                itemHeight = 48,
                initializeCell = function(cell, kind) end,
                columnCount = 2,
                refreshEnabled = true,
                refreshMessage = "loading",
            }"#,
        )
        .unwrap();

        assert_eq!(config.items.len(), 3);
        assert!(matches!(config.cell_type, Value::Function(_)));
        assert!(matches!(config.item_height, Value::Integer(_) | Value::Number(_)));
        assert!(config.initialize_cell.is_some());
        assert_eq!(config.column_count, 2);
        assert!(config.refresh_enabled);
        assert_eq!(config.refresh_message, "loading");
    }

    #[test]
    fn test_rejects_invalid_values() {
        let lua = Lua::new();
        assert!(parse(&lua, "{ items = 5 }").is_err());
        assert!(parse(&lua, "{ columnCount = 0 }").is_err());
        assert!(parse(&lua, "{ columnCount = 1.5 }").is_err());
        assert!(parse(&lua, "{ itemHeight = 'tall' }").is_err());
        assert!(parse(&lua, "{ initializeCell = 3 }").is_err());
        assert!(parse(&lua, "{ refreshEnabled = 'yes' }").is_err());
        assert!(parse(&lua, "{ refreshMessage = 5 }").is_err());
        assert!(parse(&lua, "42").is_err());
    }
}
