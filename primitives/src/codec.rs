//! Value codec: `TypedValue` <-> boundary scalar.
//!
//! Only 64-bit scalars cross the boundary. Integers travel as themselves;
//! everything else is staged in host memory and travels as the handle of
//! that block.
//!
//! Store rules:
//! - `Absent`     -> 0
//! - `Integer`    -> the integer's bits
//! - `Handle`     -> the handle's offset
//! - `Text`       -> handle of the UTF-8 bytes
//! - `Bytes`      -> handle of the raw bytes
//! - `Structured` -> handle of the canonical structured text
//! - `Enum`       -> handle of the variant value's structured text
//! - `Object`     -> handle of the object's own encoding
//!
//! Load is the inverse, driven by the declared [`TypeTag`]. For every tag
//! except `Integer`, a scalar that does not resolve to a live block loads
//! as `Absent` without reading memory.

use bytes::Bytes;

use crate::error::{CodecError, CodecResult};
use crate::memory::MemoryBridge;
use crate::structured::Structured;
use crate::types::{int_to_scalar, scalar_to_int, MemoryHandle, Scalar};
use crate::value::{TypeTag, TypedValue};

/// The byte payload a value is staged as, or `None` for values that travel
/// as the scalar itself.
pub fn encode_payload(value: &TypedValue) -> CodecResult<Option<Vec<u8>>> {
    Ok(Some(match value {
        TypedValue::Absent | TypedValue::Integer(_) | TypedValue::Handle(_) => return Ok(None),
        TypedValue::Text(s) => s.as_bytes().to_vec(),
        TypedValue::Bytes(b) => b.to_vec(),
        TypedValue::Structured(s) => s.to_vec()?,
        TypedValue::Enum(e) => e.encode(),
        TypedValue::Object(o) => o.encode()?,
    }))
}

/// Convert a value to a boundary scalar, allocating host memory as needed.
///
/// Empty text and empty bytes still allocate a (zero-length) block, so they
/// are distinguishable from `Absent`.
pub fn store<M: MemoryBridge + ?Sized>(mem: &mut M, value: TypedValue) -> CodecResult<Scalar> {
    match value {
        TypedValue::Absent => Ok(0),
        TypedValue::Integer(i) => Ok(int_to_scalar(i)),
        TypedValue::Handle(h) => Ok(h.offset()),
        other => match encode_payload(&other)? {
            Some(bytes) => Ok(mem.allocate(&bytes)?.offset()),
            None => Ok(0),
        },
    }
}

/// Convert a boundary scalar back into a value of the declared type.
pub fn load<M: MemoryBridge + ?Sized>(
    mem: &M,
    ty: &TypeTag,
    scalar: Scalar,
) -> CodecResult<TypedValue> {
    if let TypeTag::Integer = ty {
        return Ok(TypedValue::Integer(scalar_to_int(scalar)));
    }
    if scalar == 0 {
        return Ok(TypedValue::Absent);
    }
    let Some(region) = mem.resolve(scalar) else {
        return Ok(TypedValue::Absent);
    };
    if let TypeTag::Handle = ty {
        return Ok(TypedValue::Handle(region.handle()));
    }
    decode_payload(ty, mem.read_bytes(region))
}

/// Decode a byte payload according to its declared type.
///
/// Used by [`load`] after reading a block, and directly for payloads that
/// arrive by other routes (plugin input, host variables).
pub fn decode_payload(ty: &TypeTag, bytes: Vec<u8>) -> CodecResult<TypedValue> {
    match ty {
        TypeTag::Integer => {
            let text = std::str::from_utf8(&bytes).map_err(|e| CodecError::decode("int", e))?;
            text.trim()
                .parse::<i64>()
                .map(TypedValue::Integer)
                .map_err(|e| CodecError::decode("int", e))
        }
        TypeTag::Handle => Err(CodecError::unsupported(
            "handle",
            "a handle cannot be rebuilt from bytes",
        )),
        TypeTag::Text => String::from_utf8(bytes)
            .map(TypedValue::Text)
            .map_err(|e| CodecError::decode("text", e)),
        TypeTag::Bytes => Ok(TypedValue::Bytes(Bytes::from(bytes))),
        TypeTag::Mapping => shaped(&bytes, "mapping", Structured::is_map),
        TypeTag::Sequence => shaped(&bytes, "sequence", Structured::is_seq),
        TypeTag::Enumeration(ty) => ty.decode(&bytes).map(TypedValue::Enum),
        TypeTag::Object(ty) => (ty.decode)(&bytes).map(TypedValue::Object),
    }
}

fn shaped(bytes: &[u8], expected: &str, check: fn(&Structured) -> bool) -> CodecResult<TypedValue> {
    let value = Structured::from_slice(bytes)?;
    if !check(&value) {
        return Err(CodecError::decode(expected, format!("found {}", value.kind())));
    }
    Ok(TypedValue::Structured(value))
}

/// Store a value and return the handle of its block, or `None` if the value
/// travels as a plain scalar.
pub fn stage<M: MemoryBridge + ?Sized>(
    mem: &mut M,
    value: &TypedValue,
) -> CodecResult<Option<MemoryHandle>> {
    match encode_payload(value)? {
        Some(bytes) => mem.allocate(&bytes).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Arena;
    use crate::object::{Json, ObjectType};
    use crate::value::{FromValue, IntoValue};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Count {
        count: i64,
    }

    crate::enumeration! {
        enum Shade {
            Light = Text("light"),
            Dark = Int(2),
        }
    }

    #[test]
    fn test_scalar_values() {
        let mut mem = Arena::new();
        assert_eq!(store(&mut mem, TypedValue::Absent).unwrap(), 0);
        assert_eq!(store(&mut mem, TypedValue::Integer(42)).unwrap(), 42);
        assert_eq!(store(&mut mem, TypedValue::Integer(-1)).unwrap(), u64::MAX);
        assert_eq!(mem.live_blocks(), 0);

        assert_eq!(load(&mem, &TypeTag::Integer, u64::MAX).unwrap(), TypedValue::Integer(-1));
        // Zero is a legitimate integer.
        assert_eq!(load(&mem, &TypeTag::Integer, 0).unwrap(), TypedValue::Integer(0));
    }

    #[test]
    fn test_text_roundtrip() {
        let mut mem = Arena::new();
        let scalar = store(&mut mem, "hello world".into_value()).unwrap();
        assert_ne!(scalar, 0);
        assert_eq!(
            load(&mem, &TypeTag::Text, scalar).unwrap(),
            TypedValue::Text("hello world".into())
        );
    }

    #[test]
    fn test_empty_text_still_allocates() {
        let mut mem = Arena::new();
        let scalar = store(&mut mem, "".into_value()).unwrap();
        assert_ne!(scalar, 0);
        assert_eq!(load(&mem, &TypeTag::Text, scalar).unwrap(), TypedValue::Text(String::new()));

        let scalar = store(&mut mem, Vec::<u8>::new().into_value()).unwrap();
        assert_ne!(scalar, 0);
        assert_eq!(mem.live_blocks(), 2);
    }

    #[test]
    fn test_zero_and_dangling_load_absent() {
        let mem = Arena::new();
        let tags = [
            TypeTag::Text,
            TypeTag::Bytes,
            TypeTag::Mapping,
            TypeTag::Sequence,
            TypeTag::Handle,
            Shade::type_tag(),
            TypeTag::Object(ObjectType::of::<Json<Count>>()),
        ];
        for tag in tags {
            assert_eq!(load(&mem, &tag, 0).unwrap(), TypedValue::Absent);
            assert_eq!(load(&mem, &tag, 4096).unwrap(), TypedValue::Absent);
        }
    }

    #[test]
    fn test_handle_load_resolves_only() {
        let mut mem = Arena::new();
        let handle = mem.allocate(b"{not json").unwrap();
        assert_eq!(
            load(&mem, &TypeTag::Handle, handle.offset()).unwrap(),
            TypedValue::Handle(handle)
        );
        assert_eq!(store(&mut mem, TypedValue::Handle(handle)).unwrap(), handle.offset());
    }

    #[test]
    fn test_invalid_utf8_text_is_decode_failure() {
        let mut mem = Arena::new();
        let handle = mem.allocate(&[0xc3, 0x28]).unwrap();
        let err = load(&mem, &TypeTag::Text, handle.offset()).unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_mapping_shape() {
        let mut mem = Arena::new();
        let map = Structured::map().with("count", 3i64);
        let scalar = store(&mut mem, map.clone().into_value()).unwrap();
        let region = mem.resolve(scalar).unwrap();
        assert_eq!(mem.read_bytes(region), br#"{"count":3}"#);
        assert_eq!(load(&mem, &TypeTag::Mapping, scalar).unwrap(), TypedValue::Structured(map));

        let err = load(&mem, &TypeTag::Sequence, scalar).unwrap_err();
        assert!(err.is_decode_failure());
        assert!(err.to_string().contains("sequence"));
    }

    #[test]
    fn test_malformed_mapping_is_decode_failure() {
        let mut mem = Arena::new();
        let handle = mem.allocate(b"{\"a\":").unwrap();
        assert!(load(&mem, &TypeTag::Mapping, handle.offset()).unwrap_err().is_decode_failure());
    }

    #[test]
    fn test_enumeration_roundtrip() {
        let mut mem = Arena::new();
        let scalar = store(&mut mem, Shade::Dark.into_value()).unwrap();
        let loaded = load(&mem, &Shade::type_tag(), scalar).unwrap();
        assert_eq!(Shade::from_value(loaded).unwrap(), Shade::Dark);

        let scalar = store(&mut mem, Shade::Light.into_value()).unwrap();
        let loaded = load(&mem, &Shade::type_tag(), scalar).unwrap();
        assert_eq!(Shade::from_value(loaded).unwrap(), Shade::Light);
    }

    #[test]
    fn test_enumeration_without_variant() {
        let mut mem = Arena::new();
        let handle = mem.allocate(br#""medium""#).unwrap();
        let err = load(&mem, &Shade::type_tag(), handle.offset()).unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_object_roundtrip() {
        let mut mem = Arena::new();
        let scalar = store(&mut mem, Json(Count { count: 3 }).into_value()).unwrap();
        let tag = TypeTag::Object(ObjectType::of::<Json<Count>>());
        let loaded = load(&mem, &tag, scalar).unwrap();
        assert_eq!(Json::<Count>::from_value(loaded).unwrap().0, Count { count: 3 });
    }

    #[test]
    fn test_object_shape_mismatch() {
        let mut mem = Arena::new();
        let handle = mem.allocate(br#"{"total":3}"#).unwrap();
        let tag = TypeTag::Object(ObjectType::of::<Json<Count>>());
        assert!(load(&mem, &tag, handle.offset()).unwrap_err().is_decode_failure());
    }

    #[test]
    fn test_decode_payload_integer_text() {
        assert_eq!(
            decode_payload(&TypeTag::Integer, b" 17\n".to_vec()).unwrap(),
            TypedValue::Integer(17)
        );
        assert!(decode_payload(&TypeTag::Integer, b"x".to_vec()).unwrap_err().is_decode_failure());
        assert!(decode_payload(&TypeTag::Handle, vec![1]).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_stage_skips_scalars() {
        let mut mem = Arena::new();
        assert_eq!(stage(&mut mem, &TypedValue::Integer(1)).unwrap(), None);
        let handle = stage(&mut mem, &TypedValue::Text("x".into())).unwrap().unwrap();
        assert_eq!(mem.resolve(handle.offset()).unwrap().len, 1);
    }
}
