//! Typed access to the call's input and output.
//!
//! Input is decoded with the same rules as a marshalled argument of the
//! requested type; output is the value's stored byte form.

use plugwire_engine::{HostInterface, PluginResult};
use plugwire_primitives::codec::{decode_payload, encode_payload};
use plugwire_primitives::{FromValue, IntoValue, TypeTag, TypedValue};

/// Decode the call input as `T`.
///
/// `MemoryHandle` stages the raw input in host memory and yields its
/// handle; integers are parsed from their decimal text.
pub fn input<T: FromValue>(host: &mut dyn HostInterface) -> PluginResult<T> {
    let bytes = host.input_bytes()?;
    let value = match T::type_tag() {
        TypeTag::Handle => TypedValue::Handle(host.allocate(&bytes)?),
        ty => decode_payload(&ty, bytes)?,
    };
    Ok(T::from_value(value)?)
}

pub fn input_bytes(host: &mut dyn HostInterface) -> PluginResult<Vec<u8>> {
    Ok(host.input_bytes()?)
}

pub fn input_text(host: &mut dyn HostInterface) -> PluginResult<String> {
    Ok(host.input_text()?)
}

/// Set the call output from any boundary value.
///
/// Text and bytes are written verbatim; structured values, enumerations
/// and codec objects as their encoded form; integers as decimal text; a
/// handle as the bytes of its block. `Absent` writes an empty output.
pub fn output(host: &mut dyn HostInterface, value: impl IntoValue) -> PluginResult<()> {
    let value = value.into_value();
    if let Some(bytes) = encode_payload(&value)? {
        return Ok(host.output_bytes(&bytes)?);
    }
    let bytes = match value {
        TypedValue::Integer(i) => i.to_string().into_bytes(),
        TypedValue::Handle(h) => host
            .resolve(h.offset())
            .map(|region| host.read_bytes(region))
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    Ok(host.output_bytes(&bytes)?)
}

pub fn output_bytes(host: &mut dyn HostInterface, bytes: &[u8]) -> PluginResult<()> {
    Ok(host.output_bytes(bytes)?)
}

pub fn output_text(host: &mut dyn HostInterface, text: &str) -> PluginResult<()> {
    Ok(host.output_text(text)?)
}
