//! The closed value model exchanged through the codec.
//!
//! [`TypedValue`] is the tagged union of everything that can cross the
//! boundary; [`TypeTag`] is what a signature declares so the codec knows
//! how to load a scalar. [`IntoValue`] and [`FromValue`] connect plain Rust
//! types to the union for plugin authors.

use std::fmt;

use bytes::Bytes;

use crate::enumeration::{EnumType, EnumValue};
use crate::error::{CodecError, CodecResult};
use crate::object::{Codec, CodecObject, Json, ObjectType, Protobuf};
use crate::structured::Structured;
use crate::types::MemoryHandle;

/// A value tagged with its semantic kind.
#[derive(Debug)]
pub enum TypedValue {
    Absent,
    Integer(i64),
    Handle(MemoryHandle),
    Text(String),
    Bytes(Bytes),
    /// A mapping or a sequence.
    Structured(Structured),
    Enum(EnumValue),
    Object(Box<dyn CodecObject>),
}

impl TypedValue {
    /// Wrap a codec object.
    pub fn object<T: Codec>(value: T) -> Self {
        Self::Object(Box::new(value))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Integer(_) => "integer",
            Self::Handle(_) => "handle",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Structured(s) if s.is_seq() => "sequence",
            Self::Structured(_) => "mapping",
            Self::Enum(_) => "enumeration",
            Self::Object(_) => "object",
        }
    }

    /// Unwrap a codec object of type `T`.
    pub fn into_object<T: Codec>(self) -> CodecResult<T> {
        match self {
            Self::Object(object) => {
                let found = object.type_name();
                object
                    .into_inner::<T>()
                    .ok_or_else(|| CodecError::decode(T::name(), format!("found object {found}")))
            }
            other => Err(mismatch(T::name(), &other)),
        }
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Handle(a), Self::Handle(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Structured(a), Self::Structured(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            // Objects compare by type and encoded form.
            (Self::Object(a), Self::Object(b)) => {
                a.type_name() == b.type_name()
                    && matches!((a.encode(), b.encode()), (Ok(x), Ok(y)) if x == y)
            }
            _ => false,
        }
    }
}

fn mismatch(expected: &str, found: &TypedValue) -> CodecError {
    CodecError::decode(expected, format!("found {}", found.kind()))
}

/// Declared type of a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// The scalar itself is the value.
    Integer,
    /// A raw memory handle, resolved but not decoded.
    Handle,
    Text,
    Bytes,
    Mapping,
    Sequence,
    Enumeration(&'static EnumType),
    Object(ObjectType),
}

impl TypeTag {
    /// Stable textual name, used in manifests and diagnostics.
    pub fn name(&self) -> String {
        match self {
            Self::Integer => "int".into(),
            Self::Handle => "handle".into(),
            Self::Text => "text".into(),
            Self::Bytes => "bytes".into(),
            Self::Mapping => "mapping".into(),
            Self::Sequence => "sequence".into(),
            Self::Enumeration(ty) => format!("enum:{}", ty.name),
            Self::Object(ty) => format!("object:{}", ty.name),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ── Rust type bridges ──

/// Convert a Rust value into the boundary value model.
pub trait IntoValue {
    fn into_value(self) -> TypedValue;
}

/// Rebuild a Rust value from the boundary value model.
pub trait FromValue: Sized {
    /// The tag used to load a scalar destined for this type.
    fn type_tag() -> TypeTag;

    fn from_value(value: TypedValue) -> CodecResult<Self>;
}

impl IntoValue for TypedValue {
    fn into_value(self) -> TypedValue {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> TypedValue {
        TypedValue::Absent
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> TypedValue {
        match self {
            Some(v) => v.into_value(),
            None => TypedValue::Absent,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn type_tag() -> TypeTag {
        T::type_tag()
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        match value {
            TypedValue::Absent => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! integer_value {
    ($($ty:ty),+) => {$(
        impl IntoValue for $ty {
            fn into_value(self) -> TypedValue {
                TypedValue::Integer(i64::from(self))
            }
        }

        /// Fails with a decode error when the integer does not fit.
        impl FromValue for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::Integer
            }

            fn from_value(value: TypedValue) -> CodecResult<Self> {
                match value {
                    TypedValue::Integer(i) => {
                        <$ty>::try_from(i).map_err(|e| CodecError::decode(stringify!($ty), e))
                    }
                    other => Err(mismatch(stringify!($ty), &other)),
                }
            }
        }
    )+};
}

integer_value!(i64, i32, u32);

/// `u64` crosses as the raw two's-complement bits of the boundary scalar:
/// values above `i64::MAX` travel as negative integers and come back intact.
impl IntoValue for u64 {
    fn into_value(self) -> TypedValue {
        TypedValue::Integer(self as i64)
    }
}

impl FromValue for u64 {
    fn type_tag() -> TypeTag {
        TypeTag::Integer
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        match value {
            TypedValue::Integer(i) => Ok(i as u64),
            other => Err(mismatch("u64", &other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> TypedValue {
        TypedValue::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> TypedValue {
        TypedValue::Text(self.into())
    }
}

impl FromValue for String {
    fn type_tag() -> TypeTag {
        TypeTag::Text
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        match value {
            TypedValue::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl IntoValue for Bytes {
    fn into_value(self) -> TypedValue {
        TypedValue::Bytes(self)
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> TypedValue {
        TypedValue::Bytes(Bytes::from(self))
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> TypedValue {
        TypedValue::Bytes(Bytes::copy_from_slice(self))
    }
}

impl FromValue for Bytes {
    fn type_tag() -> TypeTag {
        TypeTag::Bytes
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        match value {
            TypedValue::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn type_tag() -> TypeTag {
        TypeTag::Bytes
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        Bytes::from_value(value).map(|b| b.to_vec())
    }
}

impl IntoValue for MemoryHandle {
    fn into_value(self) -> TypedValue {
        TypedValue::Handle(self)
    }
}

impl FromValue for MemoryHandle {
    fn type_tag() -> TypeTag {
        TypeTag::Handle
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        match value {
            TypedValue::Handle(h) => Ok(h),
            other => Err(mismatch("handle", &other)),
        }
    }
}

impl IntoValue for Structured {
    fn into_value(self) -> TypedValue {
        TypedValue::Structured(self)
    }
}

/// Loads as a mapping; a sequence arriving under this tag is a decode failure.
impl FromValue for Structured {
    fn type_tag() -> TypeTag {
        TypeTag::Mapping
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        match value {
            TypedValue::Structured(s) => Ok(s),
            other => Err(mismatch("mapping", &other)),
        }
    }
}

impl IntoValue for EnumValue {
    fn into_value(self) -> TypedValue {
        TypedValue::Enum(self)
    }
}

impl<T> IntoValue for Json<T>
where
    Json<T>: Codec,
{
    fn into_value(self) -> TypedValue {
        TypedValue::object(self)
    }
}

impl<T> FromValue for Json<T>
where
    Json<T>: Codec,
{
    fn type_tag() -> TypeTag {
        TypeTag::Object(ObjectType::of::<Self>())
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        value.into_object()
    }
}

impl<T> IntoValue for Protobuf<T>
where
    Protobuf<T>: Codec,
{
    fn into_value(self) -> TypedValue {
        TypedValue::object(self)
    }
}

impl<T> FromValue for Protobuf<T>
where
    Protobuf<T>: Codec,
{
    fn type_tag() -> TypeTag {
        TypeTag::Object(ObjectType::of::<Self>())
    }

    fn from_value(value: TypedValue) -> CodecResult<Self> {
        value.into_object()
    }
}

/// Implement [`IntoValue`] and [`FromValue`] for a custom [`Codec`] type.
#[macro_export]
macro_rules! codec_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::value::IntoValue for $ty {
            fn into_value(self) -> $crate::value::TypedValue {
                $crate::value::TypedValue::object(self)
            }
        }

        impl $crate::value::FromValue for $ty {
            fn type_tag() -> $crate::value::TypeTag {
                $crate::value::TypeTag::Object($crate::object::ObjectType::of::<Self>())
            }

            fn from_value(value: $crate::value::TypedValue) -> $crate::error::CodecResult<Self> {
                value.into_object()
            }
        }
    )+};
}
