//! Module-initialization context and build-time configuration.
//!
//! A [`ModuleBuilder`] collects every export and import declaration once,
//! at initialization; [`ModuleBuilder::build`] freezes them into a
//! [`PluginModule`] that the trampolines consult explicitly.

use plugwire_primitives::{Scalar, TypedValue, MAX_HOST_ARGS};

use crate::dispatch;
use crate::error::{DispatchFailure, PluginResult};
use crate::host::HostInterface;
use crate::hostcall::ImportStub;
use crate::manifest::Manifest;
use crate::registry::{Args, ExportRegistry, ImportTable};
use crate::signature::Signature;

/// Import module under which user host functions are declared by default.
pub const USER_IMPORT_MODULE: &str = "extism:host/user";

/// How results leave a typed export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallingConvention {
    /// Every return value is stored and its handle returned.
    #[default]
    SharedMemory,
    /// Stored only with a declared return type; raw scalars pass through.
    ByValue,
}

impl CallingConvention {
    /// Map the ABI-level `shared` flag (non-zero = shared memory).
    pub fn from_shared_flag(flag: i32) -> Self {
        if flag != 0 {
            Self::SharedMemory
        } else {
            Self::ByValue
        }
    }
}

/// What the ABI edge does after recording a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Return [`FAILURE_SENTINEL`](plugwire_primitives::FAILURE_SENTINEL).
    #[default]
    Sentinel,
    /// Trap across the boundary.
    Trap,
}

/// Module build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Convention used when the caller does not pick one.
    pub convention: CallingConvention,
    pub failure_mode: FailureMode,
    /// Upper bound on import arguments; capped at the shim width.
    pub max_host_args: usize,
    /// Log an entry line for every dispatch.
    pub trace_calls: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            convention: CallingConvention::SharedMemory,
            failure_mode: FailureMode::Sentinel,
            max_host_args: MAX_HOST_ARGS,
            trace_calls: false,
        }
    }
}

/// Collects export and import declarations.
#[derive(Default)]
pub struct ModuleBuilder {
    config: ModuleConfig,
    exports: ExportRegistry,
    imports: ImportTable,
}

impl ModuleBuilder {
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Declare an import in `module` and return its stub.
    pub fn import(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        signature: Signature,
    ) -> ImportStub {
        self.imports.declare(module, name, signature, self.config.max_host_args)
    }

    /// Declare a user host function.
    pub fn host_fn(&mut self, name: impl Into<String>, signature: Signature) -> ImportStub {
        self.import(USER_IMPORT_MODULE, name, signature)
    }

    pub fn export_direct<F>(&mut self, name: impl Into<String>, f: F) -> u32
    where
        F: Fn(&mut dyn HostInterface) -> PluginResult<()> + 'static,
    {
        self.exports.register_direct(name, f)
    }

    pub fn export_typed<F>(&mut self, name: impl Into<String>, signature: Signature, f: F) -> u32
    where
        F: Fn(&mut dyn HostInterface, Args) -> PluginResult<TypedValue> + 'static,
    {
        self.exports.register_typed(name, signature, f)
    }

    pub fn build(self) -> PluginModule {
        PluginModule {
            config: self.config,
            exports: self.exports,
            imports: self.imports,
        }
    }
}

/// A fully declared guest module.
pub struct PluginModule {
    config: ModuleConfig,
    exports: ExportRegistry,
    imports: ImportTable,
}

impl PluginModule {
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn exports(&self) -> &ExportRegistry {
        &self.exports
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::of(self)
    }

    /// Dispatch export `index` with an explicit calling convention.
    pub fn dispatch(
        &self,
        host: &mut dyn HostInterface,
        index: u32,
        convention: CallingConvention,
        args: &[Scalar],
    ) -> Result<Scalar, DispatchFailure> {
        dispatch::dispatch(self, host, index, convention, args)
    }

    /// Dispatch with the configured default convention.
    pub fn call(
        &self,
        host: &mut dyn HostInterface,
        index: u32,
        args: &[Scalar],
    ) -> Result<Scalar, DispatchFailure> {
        self.dispatch(host, index, self.config.convention, args)
    }
}
