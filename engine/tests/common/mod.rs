//! Shared test helpers for integration tests.
//!
//! Provides a sample plugin module, host-function fixtures and memory
//! helpers used across all integration test files.

#![allow(dead_code)]

use anyhow::{bail, Context};
use plugwire_engine::{
    HostError, HostInterface, ImportStub, MockHost, ModuleBuilder, ModuleConfig, PluginModule,
    Signature,
};
use plugwire_primitives::{
    Arena, IntoValue, Json, MemoryBridge, ObjectType, Scalar, Structured, TypeTag, TypedValue,
};
use serde::{Deserialize, Serialize};

/// Result record of `count_vowels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelCount {
    pub count: i64,
}

// ── Export indices of the sample module ──

pub const COUNT_VOWELS: u32 = 0;
pub const GREET: u32 = 1;
pub const ECHO_MAPPING: u32 = 2;
pub const FAIL: u32 = 3;
pub const REFLECT_TWICE: u32 = 4;

/// Slot of the `reflect` import.
pub const REFLECT_SLOT: u32 = 0;

pub fn count_vowels(text: &str) -> i64 {
    text.chars().filter(|c| "aeiouAEIOU".contains(*c)).count() as i64
}

/// The sample module used by the integration tests.
pub fn sample_module(config: ModuleConfig) -> PluginModule {
    let mut builder = ModuleBuilder::new(config);
    let reflect = builder.host_fn(
        "reflect",
        Signature::new().param("text", TypeTag::Text).returns(TypeTag::Text),
    );

    builder.export_typed(
        "count_vowels",
        Signature::new()
            .param("text", TypeTag::Text)
            .returns(TypeTag::Object(ObjectType::of::<Json<VowelCount>>())),
        |_, mut args| {
            let text: String = args.take(0)?;
            Ok(Json(VowelCount { count: count_vowels(&text) }).into_value())
        },
    );

    builder.export_direct("greet", |host| {
        let name = host.input_text()?;
        host.output_text(&format!("Hello, {name}!"))?;
        Ok(())
    });

    builder.export_typed(
        "echo_mapping",
        Signature::new().param("value", TypeTag::Mapping).returns(TypeTag::Mapping),
        |_, mut args| Ok(args.take::<Structured>(0)?.into_value()),
    );

    builder.export_direct("fail", |_| {
        Err(anyhow::anyhow!("root cause")).context("while failing on purpose")
    });

    builder.export_typed(
        "reflect_twice",
        Signature::new().param("text", TypeTag::Text).returns(TypeTag::Text),
        move |host, mut args| reflect_twice(&reflect, host, args.take(0)?),
    );

    builder.build()
}

fn reflect_twice(
    reflect: &ImportStub,
    host: &mut dyn HostInterface,
    text: String,
) -> anyhow::Result<TypedValue> {
    let once: String = reflect.call_as(host, vec![text.into_value()])?;
    let twice: Option<String> = reflect.call_as(host, vec![once.into_value()])?;
    match twice {
        Some(text) => Ok(text.into_value()),
        None => bail!("reflect returned nothing"),
    }
}

/// Host function that returns a copy of its first argument's block.
pub fn reflect_fn(mem: &mut Arena, args: &[Scalar]) -> Result<Scalar, HostError> {
    let first = args.first().copied().unwrap_or(0);
    let region = mem
        .resolve(first)
        .ok_or_else(|| HostError::Failed(format!("argument {first} does not resolve")))?;
    let bytes = mem.read_bytes(region);
    mem.allocate(&bytes)
        .map(|h| h.offset())
        .map_err(|e| HostError::Failed(e.to_string()))
}

/// A mock host with `reflect` bound at its slot.
pub fn host_with_reflect() -> MockHost {
    let mut host = MockHost::new();
    host.register_function(REFLECT_SLOT, reflect_fn);
    host
}

/// Allocate `bytes` in the host and return the scalar handle.
pub fn stage(host: &mut MockHost, bytes: &[u8]) -> Scalar {
    host.allocate(bytes).map(|h| h.offset()).unwrap_or(0)
}

/// Read the block behind `scalar` as UTF-8 text.
pub fn read_text(host: &MockHost, scalar: Scalar) -> String {
    let bytes = host.read_handle(scalar).unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_default()
}
