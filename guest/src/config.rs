//! Host-supplied configuration values.

use plugwire_engine::{HostInterface, PluginResult};

pub fn get(host: &mut dyn HostInterface, key: &str) -> PluginResult<Option<String>> {
    Ok(host.config_get(key)?)
}
