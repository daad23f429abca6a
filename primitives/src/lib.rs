//! `plugwire-primitives` — the value model and codec shared by the plugwire
//! dispatch engine and wasm guest.
//!
//! This crate provides memory handles, the memory bridge abstraction, the
//! closed `TypedValue` model (structured values, enumerations, codec
//! objects), and the store/load codec that maps values to 64-bit boundary
//! scalars.

pub mod types;
pub mod error;
pub mod memory;
pub mod structured;
pub mod enumeration;
pub mod object;
pub mod value;
pub mod codec;

// Re-export commonly used types at the crate root for convenience.
pub use types::{MemoryHandle, Region, Scalar, FAILURE_SENTINEL, MAX_HOST_ARGS};
pub use error::{CodecError, CodecResult};
pub use memory::{Arena, MemoryBridge};
pub use structured::Structured;
pub use enumeration::{EnumRepr, EnumType, EnumValue, EnumVariant, Enumeration};
pub use object::{Codec, CodecObject, Json, ObjectType, Protobuf};
pub use value::{FromValue, IntoValue, TypeTag, TypedValue};
pub use codec::{load, store};
