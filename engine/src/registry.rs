//! Export registry and import slot table.
//!
//! Both are append-only and densely indexed in declaration order. They are
//! filled once while the module is being built and never change afterwards;
//! the host learns the same indices out of band (see
//! [`Manifest`](crate::manifest::Manifest)).

use plugwire_primitives::{CodecResult, FromValue, TypedValue};

use crate::error::PluginResult;
use crate::host::HostInterface;
use crate::hostcall::ImportStub;
use crate::signature::Signature;

/// Body of a direct export: performs its own input/output I/O.
pub type DirectFn = Box<dyn Fn(&mut dyn HostInterface) -> PluginResult<()>>;

/// Body of a typed export: receives marshalled positional arguments.
pub type TypedFn = Box<dyn Fn(&mut dyn HostInterface, Args) -> PluginResult<TypedValue>>;

/// Registration mode of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Direct,
    Typed,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Typed => "typed",
        }
    }
}

pub enum ExportFn {
    Direct(DirectFn),
    Typed(TypedFn),
}

/// A registered export.
pub struct ExportEntry {
    pub index: u32,
    pub name: String,
    pub signature: Signature,
    pub callable: ExportFn,
}

impl ExportEntry {
    pub fn kind(&self) -> ExportKind {
        match self.callable {
            ExportFn::Direct(_) => ExportKind::Direct,
            ExportFn::Typed(_) => ExportKind::Typed,
        }
    }
}

/// Append-only list of exports, indexed from 0.
#[derive(Default)]
pub struct ExportRegistry {
    entries: Vec<ExportEntry>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an export that takes no marshalled arguments.
    pub fn register_direct<F>(&mut self, name: impl Into<String>, f: F) -> u32
    where
        F: Fn(&mut dyn HostInterface) -> PluginResult<()> + 'static,
    {
        self.push(name.into(), Signature::new(), ExportFn::Direct(Box::new(f)))
    }

    /// Register an export whose arguments and result are marshalled per
    /// `signature`.
    pub fn register_typed<F>(&mut self, name: impl Into<String>, signature: Signature, f: F) -> u32
    where
        F: Fn(&mut dyn HostInterface, Args) -> PluginResult<TypedValue> + 'static,
    {
        self.push(name.into(), signature, ExportFn::Typed(Box::new(f)))
    }

    fn push(&mut self, name: String, signature: Signature, callable: ExportFn) -> u32 {
        let index = self.entries.len() as u32;
        self.entries.push(ExportEntry {
            index,
            name,
            signature,
            callable,
        });
        index
    }

    pub fn get(&self, index: u32) -> Option<&ExportEntry> {
        self.entries.get(index as usize)
    }

    /// Index of the first export registered under `name`.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries.iter()
    }
}

/// A declared host import bound to a fixed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSlot {
    pub index: u32,
    pub module: String,
    pub name: String,
    pub signature: Signature,
}

/// Append-only list of imports, indexed from 0 in declaration order.
///
/// The host enumerates the same list to route slot indices; nothing checks
/// the two agree at runtime.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    slots: Vec<ImportSlot>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an import and return the stub that calls it.
    pub fn declare(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        signature: Signature,
        max_args: usize,
    ) -> ImportStub {
        let slot = ImportSlot {
            index: self.slots.len() as u32,
            module: module.into(),
            name: name.into(),
            signature,
        };
        let stub = ImportStub::new(&slot, max_args);
        self.slots.push(slot);
        stub
    }

    pub fn get(&self, index: u32) -> Option<&ImportSlot> {
        self.slots.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportSlot> {
        self.slots.iter()
    }
}

/// Positional arguments handed to a typed export.
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    values: Vec<TypedValue>,
}

impl Args {
    pub fn new(values: Vec<TypedValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take the argument at `position` as `T`, leaving `Absent` behind.
    /// A missing position reads as `Absent`.
    pub fn take<T: FromValue>(&mut self, position: usize) -> CodecResult<T> {
        let value = self
            .values
            .get_mut(position)
            .map(|v| std::mem::replace(v, TypedValue::Absent))
            .unwrap_or(TypedValue::Absent);
        T::from_value(value)
    }

    pub fn get(&self, position: usize) -> Option<&TypedValue> {
        self.values.get(position)
    }

    pub fn into_vec(self) -> Vec<TypedValue> {
        self.values
    }
}
