//! Signature descriptors attached to exports and imports at registration.

use plugwire_primitives::{FromValue, TypeTag};
use serde::{Deserialize, Serialize};

/// A named, typed positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: TypeTag,
}

/// Ordered parameter list plus an optional return type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub ret: Option<TypeTag>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.params.push(Param { name: name.into(), ty });
        self
    }

    /// Add a parameter typed after a Rust type.
    pub fn param_of<T: FromValue>(self, name: impl Into<String>) -> Self {
        self.param(name, T::type_tag())
    }

    pub fn returns(mut self, ty: TypeTag) -> Self {
        self.ret = Some(ty);
        self
    }

    pub fn returns_of<T: FromValue>(self) -> Self {
        self.returns(T::type_tag())
    }

    /// Type used to load the argument at `position`. Arguments past the
    /// declared parameters load as raw handles.
    pub fn param_type(&self, position: usize) -> TypeTag {
        self.params.get(position).map_or(TypeTag::Handle, |p| p.ty)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn describe(&self) -> SignatureDescription {
        SignatureDescription {
            params: self
                .params
                .iter()
                .map(|p| ParamDescription {
                    name: p.name.clone(),
                    ty: p.ty.name(),
                })
                .collect(),
            returns: self.ret.map(|t| t.name()),
        }
    }
}

/// Serializable form of a [`Signature`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureDescription {
    pub params: Vec<ParamDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_defaults() {
        let sig = Signature::new()
            .param_of::<String>("text")
            .param("count", TypeTag::Integer)
            .returns(TypeTag::Mapping);

        assert_eq!(sig.arity(), 2);
        assert_eq!(sig.param_type(0), TypeTag::Text);
        assert_eq!(sig.param_type(1), TypeTag::Integer);
        assert_eq!(sig.param_type(2), TypeTag::Handle);
        assert_eq!(sig.ret, Some(TypeTag::Mapping));
    }

    #[test]
    fn test_describe_serializes() {
        let sig = Signature::new().param("text", TypeTag::Text);
        let json = serde_json::to_string(&sig.describe()).unwrap();
        assert_eq!(json, r#"{"params":[{"name":"text","type":"text"}]}"#);
    }
}
