//! Plugin variables: small byte values the host keeps between calls.

use plugwire_engine::{HostInterface, PluginResult};

pub fn get(host: &mut dyn HostInterface, key: &str) -> PluginResult<Option<Vec<u8>>> {
    Ok(host.var_get(key)?)
}

/// Read a variable as UTF-8 text.
pub fn get_text(host: &mut dyn HostInterface, key: &str) -> PluginResult<Option<String>> {
    match host.var_get(key)? {
        Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
        None => Ok(None),
    }
}

/// Set a variable. Text values are stored as their UTF-8 bytes.
pub fn set(host: &mut dyn HostInterface, key: &str, value: impl AsRef<[u8]>) -> PluginResult<()> {
    Ok(host.var_set(key, value.as_ref())?)
}

pub fn remove(host: &mut dyn HostInterface, key: &str) -> PluginResult<()> {
    Ok(host.var_remove(key)?)
}
