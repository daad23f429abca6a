//! Dispatch trampoline — the indexed entry point the host calls.
//!
//! A call walks Resolving → MarshallingIn → Invoking → MarshallingOut.
//! Any failure along the way is caught here and returned as a
//! [`DispatchFailure`] naming the stage; nothing below this point catches
//! or retries. Translating the failure into the host's error channel is
//! left to the outermost edge.

use plugwire_primitives::types::int_to_scalar;
use plugwire_primitives::{codec, CodecError, Scalar, TypedValue};

use crate::error::{DispatchError, DispatchFailure, Stage};
use crate::host::HostInterface;
use crate::module::{CallingConvention, PluginModule};
use crate::registry::{Args, ExportFn};
use crate::signature::Signature;

/// Dispatch export `index` with the positional argument scalars `args`.
///
/// Direct exports ignore `args` and return 0 on success. Typed exports
/// load each argument with its declared type and marshal the result
/// according to `convention`.
pub fn dispatch(
    module: &PluginModule,
    host: &mut dyn HostInterface,
    index: u32,
    convention: CallingConvention,
    args: &[Scalar],
) -> Result<Scalar, DispatchFailure> {
    let exports = module.exports();
    let entry = exports.get(index).ok_or_else(|| {
        DispatchFailure::new(
            index,
            None,
            Stage::Resolving,
            DispatchError::IndexOutOfRange {
                index,
                len: exports.len(),
            },
        )
    })?;
    let fail = |stage: Stage, error: DispatchError| {
        DispatchFailure::new(index, Some(entry.name.clone()), stage, error)
    };

    match &entry.callable {
        ExportFn::Direct(f) => {
            f(&mut *host).map_err(|e| fail(Stage::Invoking, DispatchError::Guest(e)))?;
            Ok(0)
        }
        ExportFn::Typed(f) => {
            let values = marshal_in(&mut *host, &entry.signature, args)
                .map_err(|e| fail(Stage::MarshallingIn, e))?;
            let ret = f(&mut *host, Args::new(values))
                .map_err(|e| fail(Stage::Invoking, DispatchError::Guest(e)))?;
            marshal_out(host, &entry.signature, convention, ret)
                .map_err(|e| fail(Stage::MarshallingOut, e))
        }
    }
}

fn marshal_in(
    host: &mut dyn HostInterface,
    signature: &Signature,
    args: &[Scalar],
) -> Result<Vec<TypedValue>, DispatchError> {
    if args.len() < signature.arity() {
        return Err(DispatchError::ArgumentCount {
            expected: signature.arity(),
            got: args.len(),
        });
    }
    args.iter()
        .enumerate()
        .map(|(position, scalar)| {
            Ok(codec::load(&*host, &signature.param_type(position), *scalar)?)
        })
        .collect()
}

fn marshal_out(
    host: &mut dyn HostInterface,
    signature: &Signature,
    convention: CallingConvention,
    value: TypedValue,
) -> Result<Scalar, DispatchError> {
    match (convention, signature.ret) {
        (CallingConvention::SharedMemory, _) | (CallingConvention::ByValue, Some(_)) => {
            Ok(codec::store(&mut *host, value)?)
        }
        (CallingConvention::ByValue, None) => passthrough(value),
    }
}

/// By-value return without a declared type: only scalars can cross as-is.
fn passthrough(value: TypedValue) -> Result<Scalar, DispatchError> {
    match value {
        TypedValue::Absent => Ok(0),
        TypedValue::Integer(i) => Ok(int_to_scalar(i)),
        TypedValue::Handle(h) => Ok(h.offset()),
        other => Err(CodecError::unsupported(
            other.kind(),
            "by-value results without a declared return type must be scalars",
        )
        .into()),
    }
}
