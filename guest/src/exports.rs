//! The ABI edge: what the host actually calls.
//!
//! Tooling-generated export wrappers push their positional scalars with
//! `__arg_start` / `__arg_i32` / `__arg_i64` and then call one of the
//! `__invoke*` functions with the export's index and the `shared` flag.
//! [`Edge`] holds the staged arguments and the built module, dispatches,
//! and translates a structured [`DispatchFailure`] into the host's
//! single-slot error channel plus the failure sentinel.
//!
//! The wasm exports themselves are emitted by [`plugin_module!`](crate::plugin_module!).
//! Exported functions must never unwind; a trap is the only other outcome.

use std::cell::RefCell;
use std::thread::LocalKey;

use plugwire_engine::{
    CallingConvention, DispatchFailure, FailureMode, HostInterface, LogLevel, PluginModule,
};
use plugwire_primitives::types::int_to_scalar;
use plugwire_primitives::{Scalar, FAILURE_SENTINEL};

/// The call failed and the module is configured to trap. The error channel
/// has already been populated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("trap: {0}")]
pub struct Trap(pub String);

/// A built module bound to its host, plus the staged argument list.
pub struct Edge<H: HostInterface> {
    module: PluginModule,
    host: H,
    staged: Vec<Scalar>,
}

impl<H: HostInterface> Edge<H> {
    pub fn new(module: PluginModule, host: H) -> Self {
        Self {
            module,
            host,
            staged: Vec::new(),
        }
    }

    pub fn module(&self) -> &PluginModule {
        &self.module
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Begin staging arguments for the next invoke.
    pub fn arg_start(&mut self) {
        self.staged.clear();
    }

    /// Stage a 32-bit argument, sign-extended.
    pub fn arg_i32(&mut self, value: i32) {
        self.staged.push(int_to_scalar(i64::from(value)));
    }

    pub fn arg_i64(&mut self, value: i64) {
        self.staged.push(int_to_scalar(value));
    }

    pub fn staged(&self) -> &[Scalar] {
        &self.staged
    }

    /// Dispatch export `index` with the staged arguments.
    ///
    /// A non-zero `shared` selects the shared-memory convention. On failure
    /// the rendered diagnostic is written to the error channel and the
    /// sentinel is returned, or [`Trap`] under [`FailureMode::Trap`].
    pub fn invoke(&mut self, index: i32, shared: i32) -> Result<Scalar, Trap> {
        match self.dispatch_staged(index, shared) {
            Ok(scalar) => Ok(scalar),
            Err(failure) => self.fail(&failure),
        }
    }

    /// Dispatch the export registered under `name` with no arguments and
    /// report 0 on success, 1 on failure.
    ///
    /// Success is decided by the dispatch outcome, not the result scalar,
    /// so an export returning `-1` still reports 0.
    pub fn invoke_named(&mut self, name: &str) -> Result<i32, Trap> {
        let Some(index) = self.module.exports().index_of(name) else {
            let message = format!("no export named `{name}`");
            self.host.set_error(&message);
            return self.trap_or(message, 1);
        };
        self.arg_start();
        let shared = i32::from(self.module.config().convention == CallingConvention::SharedMemory);
        match self.dispatch_staged(index as i32, shared) {
            Ok(_) => Ok(0),
            Err(failure) => self.fail(&failure).map(|_| 1),
        }
    }

    /// Handle of the module manifest's JSON, or 0 if it cannot be staged.
    /// A staging failure is written to the error channel.
    pub fn manifest(&mut self) -> Scalar {
        let staged = match self.module.manifest().to_json() {
            Ok(json) => self.host.allocate(json.as_bytes()).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match staged {
            Ok(handle) => handle.offset(),
            Err(reason) => {
                let message = format!("manifest could not be staged: {reason}");
                let _ = self.host.log(LogLevel::Debug, &message);
                self.host.set_error(&message);
                0
            }
        }
    }

    fn dispatch_staged(&mut self, index: i32, shared: i32) -> Result<Scalar, DispatchFailure> {
        let args = std::mem::take(&mut self.staged);
        let convention = CallingConvention::from_shared_flag(shared);
        if self.module.config().trace_calls {
            let line = format!("dispatch #{index} ({} args, {convention:?})", args.len());
            let _ = self.host.log(LogLevel::Debug, &line);
        }
        self.module.dispatch(&mut self.host, index as u32, convention, &args)
    }

    fn fail(&mut self, failure: &DispatchFailure) -> Result<Scalar, Trap> {
        let message = failure.render();
        let _ = self.host.log(LogLevel::Debug, &message);
        self.host.set_error(&message);
        self.trap_or(message, FAILURE_SENTINEL)
    }

    fn trap_or<T>(&self, message: String, value: T) -> Result<T, Trap> {
        match self.module.config().failure_mode {
            FailureMode::Sentinel => Ok(value),
            FailureMode::Trap => Err(Trap(message)),
        }
    }
}

// ── Support for the generated exports ──

/// Run `f` on the edge stored in `cell`, or `busy` if a dispatch is
/// already in progress on this instance.
pub fn with_edge<H: HostInterface + 'static, R>(
    cell: &'static LocalKey<RefCell<Edge<H>>>,
    busy: impl FnOnce() -> R,
    f: impl FnOnce(&mut Edge<H>) -> R,
) -> R {
    cell.with(|edge| match edge.try_borrow_mut() {
        Ok(mut edge) => f(&mut edge),
        Err(_) => busy(),
    })
}

/// Reject a nested dispatch.
pub fn reject_nested<H: HostInterface>(host: &mut H) -> Scalar {
    host.set_error("nested dispatch is not supported");
    FAILURE_SENTINEL
}

/// Abort the instance. On wasm this is a trap.
pub fn trap(_: Trap) -> ! {
    std::process::abort()
}

/// Emit the wasm exports for a module.
///
/// `$init` is a function returning the [`PluginModule`]; it runs once per
/// instance, on the first call. The optional `direct` list emits a
/// zero-argument `#[no_mangle]` export per name that dispatches the
/// export registered under that name and returns 0 or 1.
///
/// ```ignore
/// plugwire_guest::plugin_module!(build, direct: [greet]);
/// ```
#[macro_export]
macro_rules! plugin_module {
    ($init:path $(, direct: [$($name:ident),* $(,)?])? $(,)?) => {
        #[cfg(target_arch = "wasm32")]
        ::std::thread_local! {
            static __PLUGWIRE_EDGE: ::std::cell::RefCell<$crate::Edge<$crate::WasmHost>> =
                ::std::cell::RefCell::new($crate::Edge::new($init(), $crate::WasmHost));
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn __arg_start() {
            $crate::exports::with_edge(&__PLUGWIRE_EDGE, || (), |edge| edge.arg_start())
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn __arg_i32(value: i32) {
            $crate::exports::with_edge(&__PLUGWIRE_EDGE, || (), |edge| edge.arg_i32(value))
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn __arg_i64(value: i64) {
            $crate::exports::with_edge(&__PLUGWIRE_EDGE, || (), |edge| edge.arg_i64(value))
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn __invoke_i64(index: i32, shared: i32) -> i64 {
            let outcome = $crate::exports::with_edge(
                &__PLUGWIRE_EDGE,
                || Ok($crate::exports::reject_nested(&mut $crate::WasmHost)),
                |edge| edge.invoke(index, shared),
            );
            match outcome {
                Ok(scalar) => scalar as i64,
                Err(trap) => $crate::exports::trap(trap),
            }
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn __invoke_i32(index: i32, shared: i32) -> i32 {
            __invoke_i64(index, shared) as i32
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn __invoke(index: i32, shared: i32) {
            __invoke_i64(index, shared);
        }

        #[cfg(target_arch = "wasm32")]
        #[no_mangle]
        pub extern "C" fn __plugin_manifest() -> i64 {
            $crate::exports::with_edge(&__PLUGWIRE_EDGE, || 0, |edge| edge.manifest()) as i64
        }

        $($(
            #[cfg(target_arch = "wasm32")]
            #[no_mangle]
            pub extern "C" fn $name() -> i32 {
                let outcome = $crate::exports::with_edge(
                    &__PLUGWIRE_EDGE,
                    || {
                        $crate::exports::reject_nested(&mut $crate::WasmHost);
                        Ok(1)
                    },
                    |edge| edge.invoke_named(stringify!($name)),
                );
                match outcome {
                    Ok(code) => code,
                    Err(trap) => $crate::exports::trap(trap),
                }
            }
        )*)?
    };
}
