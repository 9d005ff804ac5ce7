use crate::lua::helpers::ScriptProperties;
use crate::lua::register_collection_module;
use mlua::prelude::*;
use rover_bridge::{Channel, Host, NativeEvent, TickReport};

/// A Lua interpreter wired to one bridge channel
pub struct ScriptSession {
    /// Lua interpreter (owned)
    lua: Lua,
    /// Bridge channel (shared with Lua app_data)
    channel: Channel,
}

impl ScriptSession {
    /// Create a session talking to `host`
    pub fn new(host: impl Host + 'static) -> LuaResult<Self> {
        let lua = Lua::new();
        let channel = Channel::new(host);

        // Store channel and property store in Lua app_data for access from Lua
        lua.set_app_data(channel.clone());
        lua.set_app_data(ScriptProperties::default());

        // Register rover module
        let rover_table = lua.create_table()?;
        register_collection_module(&lua, &rover_table)?;
        lua.globals().set("rover", rover_table)?;

        Ok(Self { lua, channel })
    }

    /// Get a reference to the Lua interpreter
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Get the bridge channel
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Run a Lua script as one logic turn; its commands reach the host when it returns
    pub fn run_script(&self, script: &str) -> LuaResult<()> {
        let result = self.lua.load(script).exec();
        self.channel.end_turn();
        result
    }

    /// Queue an event from the host
    pub fn post(&self, event: NativeEvent) {
        self.channel.post(event);
    }

    /// Dispatch every queued host event, one turn each
    pub fn tick(&self) -> TickReport {
        self.channel.tick()
    }
}

impl Drop for ScriptSession {
    fn drop(&mut self) {
        // Lists never disposed by the script are owned by the channel
        self.channel.detach_all();
    }
}
