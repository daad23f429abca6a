//! `plugwire-engine` — export/import bookkeeping and the two trampolines.
//!
//! This crate sits between the host's scalar-only call boundary and
//! plugin-authored Rust functions:
//!
//! - [`host::HostInterface`] — trait abstracting the host primitives
//! - [`host::MockHost`] — in-memory implementation for testing
//! - [`registry`] — the export registry and import slot table
//! - [`dispatch`] — the dispatch trampoline (host → guest)
//! - [`hostcall::ImportStub`] — the host-call trampoline (guest → host)
//! - [`module::ModuleBuilder`] — the module-initialization context
//! - [`manifest::Manifest`] — the serializable index contract
//!
//! Registries are owned by a [`PluginModule`] and passed explicitly into
//! the trampolines; there is no ambient registration state.

pub mod error;
pub mod error_channel;
pub mod host;
pub mod signature;
pub mod registry;
pub mod hostcall;
pub mod dispatch;
pub mod module;
pub mod manifest;

// Re-export key types for convenience
pub use error::{DispatchError, DispatchFailure, HostCallError, HostError, PluginResult, Stage};
pub use error_channel::ErrorChannel;
pub use host::{HostInterface, LogLevel, LogLine, MockHost};
pub use hostcall::ImportStub;
pub use manifest::Manifest;
pub use module::{CallingConvention, FailureMode, ModuleBuilder, ModuleConfig, PluginModule};
pub use registry::{Args, ExportKind, ExportRegistry, ImportTable};
pub use signature::Signature;
