//! Enumerations across the boundary.
//!
//! An enumeration is stored as the structured-text encoding of its variant's
//! value (an integer or a text literal) and loaded by matching the decoded
//! value against the declared variants.

use std::fmt;

use serde_json::Value;

use crate::error::{CodecError, CodecResult};

/// The value a variant is represented by on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRepr {
    Int(i64),
    Text(&'static str),
}

/// One declared variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: &'static str,
    pub value: EnumRepr,
}

/// Descriptor of an enumeration type, used as a load-time type tag.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumType {
    pub name: &'static str,
    pub variants: &'static [EnumVariant],
}

impl EnumType {
    pub fn variant_named(&'static self, name: &str) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|v| v.name == name)
            .map(|variant| EnumValue { ty: self, variant })
    }

    /// Decode a stored enumeration and construct its variant.
    ///
    /// Matching happens on the literal JSON value, before any base64 or
    /// date-time reinterpretation, so text values such as `"blue"` resolve.
    pub fn decode(&'static self, bytes: &[u8]) -> CodecResult<EnumValue> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| CodecError::decode(self.name, e))?;
        let variant = self
            .variants
            .iter()
            .find(|v| match (v.value, &value) {
                (EnumRepr::Int(i), Value::Number(n)) => n.as_i64() == Some(i),
                (EnumRepr::Text(s), Value::String(t)) => s == t.as_str(),
                _ => false,
            })
            .ok_or_else(|| CodecError::decode(self.name, format!("no variant has value {value}")))?;
        Ok(EnumValue { ty: self, variant })
    }
}

/// A concrete variant of a declared enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub ty: &'static EnumType,
    pub variant: &'static EnumVariant,
}

impl EnumValue {
    /// Encode the variant's value in structured-text form.
    pub fn encode(&self) -> Vec<u8> {
        match self.variant.value {
            EnumRepr::Int(i) => i.to_string().into_bytes(),
            EnumRepr::Text(s) => Value::String(s.into()).to_string().into_bytes(),
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.ty.name, self.variant.name)
    }
}

/// A Rust enum that crosses the boundary as an enumeration.
///
/// Usually implemented with [`enumeration!`](crate::enumeration!).
pub trait Enumeration: Sized + 'static {
    const TYPE: &'static EnumType;

    fn from_variant(variant: &EnumVariant) -> Option<Self>;

    fn variant(&self) -> &'static EnumVariant;

    fn to_value(&self) -> EnumValue {
        EnumValue {
            ty: Self::TYPE,
            variant: self.variant(),
        }
    }
}

/// Declare a fieldless enum together with its [`Enumeration`] impl.
///
/// The generated enum derives `Debug, Clone, Copy, PartialEq, Eq`.
///
/// ```
/// plugwire_primitives::enumeration! {
///     pub enum Color {
///         Red = Text("red"),
///         Blue = Text("blue"),
///     }
/// }
/// ```
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $kind:ident($value:expr)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::enumeration::Enumeration for $name {
            const TYPE: &'static $crate::enumeration::EnumType = &$crate::enumeration::EnumType {
                name: stringify!($name),
                variants: &[$(
                    $crate::enumeration::EnumVariant {
                        name: stringify!($variant),
                        value: $crate::enumeration::EnumRepr::$kind($value),
                    }
                ),+],
            };

            fn from_variant(variant: &$crate::enumeration::EnumVariant) -> Option<Self> {
                match variant.name {
                    $(stringify!($variant) => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn variant(&self) -> &'static $crate::enumeration::EnumVariant {
                &<Self as $crate::enumeration::Enumeration>::TYPE.variants[*self as usize]
            }
        }

        impl $crate::value::IntoValue for $name {
            fn into_value(self) -> $crate::value::TypedValue {
                $crate::value::TypedValue::Enum($crate::enumeration::Enumeration::to_value(&self))
            }
        }

        impl $crate::value::FromValue for $name {
            fn type_tag() -> $crate::value::TypeTag {
                $crate::value::TypeTag::Enumeration(
                    <Self as $crate::enumeration::Enumeration>::TYPE,
                )
            }

            fn from_value(value: $crate::value::TypedValue) -> $crate::error::CodecResult<Self> {
                $crate::enumeration::from_enum_value(value)
            }
        }
    };
}

/// Recover a concrete [`Enumeration`] from a loaded value.
pub fn from_enum_value<E: Enumeration>(value: crate::value::TypedValue) -> CodecResult<E> {
    match value {
        crate::value::TypedValue::Enum(v) if v.ty == E::TYPE => {
            E::from_variant(v.variant).ok_or_else(|| {
                CodecError::decode(E::TYPE.name, format!("unknown variant {}", v.variant.name))
            })
        }
        other => Err(CodecError::decode(E::TYPE.name, format!("found {}", other.kind()))),
    }
}
