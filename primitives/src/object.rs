//! Codec objects — user-defined records with their own byte encoding.
//!
//! Any structured payload that is not a plain mapping or sequence crosses
//! the boundary as a codec object: it encodes itself to bytes on store and
//! is rebuilt from those bytes on load. Two stock codecs are provided:
//! [`Json`] (serde + structured text) and [`Protobuf`] (prost).

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};

/// The encode/decode contract for a codec object.
pub trait Codec: fmt::Debug + Sized + 'static {
    /// Name used in diagnostics. Defaults to the Rust type name.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn encode(&self) -> CodecResult<Vec<u8>>;

    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

/// Type-erased codec object carried inside a `TypedValue`.
pub trait CodecObject: fmt::Debug {
    fn type_name(&self) -> &'static str;

    fn encode(&self) -> CodecResult<Vec<u8>>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Codec> CodecObject for T {
    fn type_name(&self) -> &'static str {
        <T as Codec>::name()
    }

    fn encode(&self) -> CodecResult<Vec<u8>> {
        Codec::encode(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn CodecObject {
    pub fn downcast_ref<T: Codec>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Unwrap into the concrete type, or `None` if this object is not a `T`.
    pub fn into_inner<T: Codec>(self: Box<Self>) -> Option<T> {
        self.into_any().downcast::<T>().ok().map(|b| *b)
    }
}

/// Load-time descriptor for a codec object type.
#[derive(Clone, Copy)]
pub struct ObjectType {
    pub name: &'static str,
    pub decode: fn(&[u8]) -> CodecResult<Box<dyn CodecObject>>,
}

fn decode_boxed<T: Codec>(bytes: &[u8]) -> CodecResult<Box<dyn CodecObject>> {
    T::decode(bytes).map(|v| Box::new(v) as Box<dyn CodecObject>)
}

impl ObjectType {
    pub fn of<T: Codec>() -> Self {
        Self {
            name: T::name(),
            decode: decode_boxed::<T>,
        }
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectType").field(&self.name).finish()
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ObjectType {}

// ── Stock codecs ──

/// A serde type encoded as canonical structured text.
///
/// Decoding goes straight through serde, so string fields are *not*
/// reinterpreted as base64 or date-times.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Codec for Json<T>
where
    T: Serialize + DeserializeOwned + fmt::Debug + 'static,
{
    fn name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn encode(&self) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(&self.0)
            .map_err(|e| CodecError::unsupported(Self::name(), e.to_string()))
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        serde_json::from_slice(bytes)
            .map(Json)
            .map_err(|e| CodecError::decode(Self::name(), e))
    }
}

/// A prost message encoded in protobuf wire format.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Protobuf<T>(pub T);

impl<T> Codec for Protobuf<T>
where
    T: prost::Message + Default + 'static,
{
    fn name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn encode(&self) -> CodecResult<Vec<u8>> {
        Ok(self.0.encode_to_vec())
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        T::decode(bytes)
            .map(Protobuf)
            .map_err(|e| CodecError::decode(Self::name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Count {
        count: i64,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    struct Point {
        #[prost(int64, tag = "1")]
        x: i64,
        #[prost(string, tag = "2")]
        label: String,
    }

    #[test]
    fn test_json_encode() {
        let bytes = Codec::encode(&Json(Count { count: 3 })).unwrap();
        assert_eq!(bytes, br#"{"count":3}"#);
    }

    #[test]
    fn test_json_decode_keeps_plain_text() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Note {
            text: String,
        }
        let decoded = <Json<Note> as Codec>::decode(br#"{"text":"2024-01-01T00:00:00"}"#).unwrap();
        assert_eq!(decoded.0.text, "2024-01-01T00:00:00");
    }

    #[test]
    fn test_json_decode_failure_names_type() {
        let err = <Json<Count> as Codec>::decode(b"[1,2]").unwrap_err();
        assert!(err.is_decode_failure());
        assert!(err.to_string().contains("Count"));
    }

    #[test]
    fn test_protobuf_roundtrip_through_object_type() {
        let point = Protobuf(Point { x: -7, label: "origin".into() });
        let bytes = Codec::encode(&point).unwrap();

        let ty = ObjectType::of::<Protobuf<Point>>();
        let object = (ty.decode)(&bytes).unwrap();
        assert_eq!(object.type_name(), ty.name);
        assert_eq!(object.downcast_ref::<Protobuf<Point>>(), Some(&point));
        assert_eq!(object.into_inner::<Protobuf<Point>>(), Some(point));
    }

    #[test]
    fn test_into_inner_wrong_type() {
        let object: Box<dyn CodecObject> = Box::new(Json(Count { count: 1 }));
        assert!(object.into_inner::<Protobuf<Point>>().is_none());
    }

    #[test]
    fn test_object_type_equality_by_name() {
        assert_eq!(ObjectType::of::<Json<Count>>(), ObjectType::of::<Json<Count>>());
        assert_ne!(ObjectType::of::<Json<Count>>(), ObjectType::of::<Protobuf<Point>>());
    }
}
