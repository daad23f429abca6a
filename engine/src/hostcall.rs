//! Host-call trampoline: the stub behind each declared import.

use plugwire_primitives::{codec, FromValue, TypedValue, MAX_HOST_ARGS};

use crate::error::HostCallError;
use crate::host::HostInterface;
use crate::registry::ImportSlot;
use crate::signature::Signature;

/// Callable stub for one import slot.
///
/// Arguments are stored through the value codec and passed to the host by
/// slot index. With a declared return type the with-result entry point is
/// used and its scalar is loaded with that type; otherwise the no-result
/// entry point is used and the call yields `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStub {
    slot: u32,
    name: String,
    signature: Signature,
    max_args: usize,
}

impl ImportStub {
    pub(crate) fn new(slot: &ImportSlot, max_args: usize) -> Self {
        Self {
            slot: slot.index,
            name: slot.name.clone(),
            signature: slot.signature.clone(),
            max_args: max_args.min(MAX_HOST_ARGS),
        }
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn call(
        &self,
        host: &mut dyn HostInterface,
        args: Vec<TypedValue>,
    ) -> Result<TypedValue, HostCallError> {
        if args.len() > self.max_args {
            return Err(HostCallError::TooManyArguments {
                max: self.max_args,
                got: args.len(),
            });
        }

        let mut scalars = Vec::with_capacity(args.len());
        for arg in args {
            scalars.push(codec::store(&mut *host, arg)?);
        }

        match &self.signature.ret {
            Some(ty) => {
                let result = host.invoke_host_with_result(self.slot, &scalars)?;
                Ok(codec::load(&*host, ty, result)?)
            }
            None => {
                host.invoke_host_no_result(self.slot, &scalars)?;
                Ok(TypedValue::Absent)
            }
        }
    }

    /// [`call`](Self::call) and convert the result to `R`.
    pub fn call_as<R: FromValue>(
        &self,
        host: &mut dyn HostInterface,
        args: Vec<TypedValue>,
    ) -> Result<R, HostCallError> {
        Ok(R::from_value(self.call(host, args)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::MockHost;
    use crate::registry::ImportTable;
    use plugwire_primitives::{IntoValue, MemoryBridge, TypeTag};

    fn reflect(table: &mut ImportTable) -> ImportStub {
        table.declare(
            "extism:host/user",
            "reflect",
            Signature::new().param("text", TypeTag::Text).returns(TypeTag::Text),
            MAX_HOST_ARGS,
        )
    }

    fn echo_first(host: &mut MockHost, slot: u32) {
        host.register_function(slot, |mem, args| {
            let region = mem
                .resolve(args[0])
                .ok_or_else(|| HostError::Failed("dangling argument".into()))?;
            let bytes = mem.read_bytes(region);
            mem.allocate(&bytes)
                .map(|h| h.offset())
                .map_err(|e| HostError::Failed(e.to_string()))
        });
    }

    #[test]
    fn test_with_result_call() {
        let mut table = ImportTable::new();
        let stub = reflect(&mut table);
        let mut host = MockHost::new();
        echo_first(&mut host, 0);

        let result: String = stub.call_as(&mut host, vec!["abc".into_value()]).unwrap();
        assert_eq!(result, "abc");

        let call = &host.calls()[0];
        assert_eq!(call.slot, 0);
        assert!(call.with_result);
        assert_eq!(host.read_handle(call.args[0]).unwrap(), b"abc");
    }

    #[test]
    fn test_no_result_call() {
        let mut table = ImportTable::new();
        let signature = Signature::new().param("n", TypeTag::Integer);
        let stub = table.declare("extism:host/user", "notify", signature, 5);
        let mut host = MockHost::new();
        host.register_function(0, |_, _| Ok(99));

        let result = stub.call(&mut host, vec![7i64.into_value()]).unwrap();
        assert_eq!(result, TypedValue::Absent);
        assert_eq!(host.calls()[0].args, vec![7]);
        assert!(!host.calls()[0].with_result);
    }

    #[test]
    fn test_too_many_arguments() {
        let mut table = ImportTable::new();
        let stub = reflect(&mut table);
        let mut host = MockHost::new();
        let args = (0..6).map(|i: i64| i.into_value()).collect();

        let err = stub.call(&mut host, args).unwrap_err();
        assert!(matches!(err, HostCallError::TooManyArguments { max: 5, got: 6 }));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_configured_limit_is_capped() {
        let mut table = ImportTable::new();
        let stub = table.declare("m", "f", Signature::new(), 2);
        let mut host = MockHost::new();
        let args = vec![1i64.into_value(), 2i64.into_value(), 3i64.into_value()];
        let err = stub.call(&mut host, args).unwrap_err();
        assert!(matches!(err, HostCallError::TooManyArguments { max: 2, got: 3 }));

        let wide = table.declare("m", "g", Signature::new(), 64);
        assert_eq!(wide.max_args, MAX_HOST_ARGS);
    }

    #[test]
    fn test_unbound_slot_propagates() {
        let mut table = ImportTable::new();
        let stub = reflect(&mut table);
        let mut host = MockHost::new();
        let err = stub.call(&mut host, vec!["abc".into_value()]).unwrap_err();
        assert!(matches!(err, HostCallError::Host(HostError::UnknownSlot(0))));
    }

    #[test]
    fn test_null_result_loads_absent() {
        let mut table = ImportTable::new();
        let stub = reflect(&mut table);
        let mut host = MockHost::new();
        host.register_function(0, |_, _| Ok(0));
        let result: Option<String> = stub.call_as(&mut host, vec!["abc".into_value()]).unwrap();
        assert_eq!(result, None);
    }
}
