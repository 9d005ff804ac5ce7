use mlua::{FromLua, IntoLua, Lua, Result, Value};

/// Lua value held as a list item or a cell kind.
///
/// Equality follows Lua raw equality: primitives by value (integers and floats compare
/// numerically), strings by content, tables, functions and userdata by identity.
#[derive(Debug, Clone)]
pub struct ScriptValue(pub Value);

impl ScriptValue {
    pub fn nil() -> Self {
        ScriptValue(Value::Nil)
    }
}

impl Default for ScriptValue {
    fn default() -> Self {
        Self::nil()
    }
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (a, b) => {
                let pointer = a.to_pointer();
                !pointer.is_null() && pointer == b.to_pointer()
            }
        }
    }
}

impl From<Value> for ScriptValue {
    fn from(value: Value) -> Self {
        ScriptValue(value)
    }
}

impl FromLua for ScriptValue {
    fn from_lua(value: Value, _lua: &Lua) -> Result<Self> {
        Ok(ScriptValue(value))
    }
}

impl IntoLua for ScriptValue {
    fn into_lua(self, _lua: &Lua) -> Result<Value> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_equality() {
        let lua = Lua::new();
        let a = ScriptValue(Value::String(lua.create_string("row").unwrap()));
        let b = ScriptValue(Value::String(lua.create_string("row").unwrap()));
        assert_eq!(a, b);
        assert_eq!(ScriptValue(Value::Integer(2)), ScriptValue(Value::Number(2.0)));
        assert_ne!(ScriptValue(Value::Integer(2)), ScriptValue(Value::Boolean(true)));
        assert_eq!(ScriptValue::default(), ScriptValue::nil());
    }

    #[test]
    fn test_tables_compare_by_identity() {
        let lua = Lua::new();
        let t1 = lua.create_table().unwrap();
        let t2 = lua.create_table().unwrap();

        let a = ScriptValue(Value::Table(t1.clone()));
        assert_eq!(a, ScriptValue(Value::Table(t1)));
        assert_ne!(a, ScriptValue(Value::Table(t2)));
    }
}
