//! Module manifest: the export and import tables in serializable form.
//!
//! Export indices and import slots are an out-of-band contract between the
//! guest and the host; publishing the manifest lets the host and build
//! tooling check they enumerate the same lists.

use serde::{Deserialize, Serialize};

use crate::module::PluginModule;
use crate::signature::SignatureDescription;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDescription {
    pub index: u32,
    pub name: String,
    pub kind: String,
    #[serde(flatten)]
    pub signature: SignatureDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDescription {
    pub index: u32,
    pub module: String,
    pub name: String,
    #[serde(flatten)]
    pub signature: SignatureDescription,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub exports: Vec<ExportDescription>,
    pub imports: Vec<ImportDescription>,
}

impl Manifest {
    pub fn of(module: &PluginModule) -> Self {
        Self {
            exports: module
                .exports()
                .iter()
                .map(|e| ExportDescription {
                    index: e.index,
                    name: e.name.clone(),
                    kind: e.kind().as_str().to_string(),
                    signature: e.signature.describe(),
                })
                .collect(),
            imports: module
                .imports()
                .iter()
                .map(|i| ImportDescription {
                    index: i.index,
                    module: i.module.clone(),
                    name: i.name.clone(),
                    signature: i.signature.describe(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn export_named(&self, name: &str) -> Option<&ExportDescription> {
        self.exports.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleBuilder;
    use crate::signature::Signature;
    use plugwire_primitives::{TypeTag, TypedValue};

    fn module() -> PluginModule {
        let mut builder = ModuleBuilder::default();
        let reflect = Signature::new().param("text", TypeTag::Text).returns(TypeTag::Text);
        builder.host_fn("reflect", reflect);
        builder.export_direct("greet", |_| Ok(()));
        builder.export_typed(
            "count_vowels",
            Signature::new().param("text", TypeTag::Text).returns(TypeTag::Mapping),
            |_, _| Ok(TypedValue::Absent),
        );
        builder.build()
    }

    #[test]
    fn test_manifest_lists_tables_in_order() {
        let manifest = module().manifest();
        assert_eq!(manifest.exports.len(), 2);
        assert_eq!(manifest.exports[1].name, "count_vowels");
        assert_eq!(manifest.exports[1].kind, "typed");
        assert_eq!(manifest.exports[1].signature.returns.as_deref(), Some("mapping"));
        assert_eq!(manifest.imports[0].module, "extism:host/user");
        assert_eq!(manifest.export_named("greet").map(|e| e.index), Some(0));
    }

    #[test]
    fn test_manifest_json_shape() {
        let json = module().manifest().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["exports"][0]["name"], "greet");
        assert_eq!(value["exports"][0]["params"], serde_json::json!([]));
        assert_eq!(value["imports"][0]["params"][0]["type"], "text");

        assert_eq!(Manifest::from_json(&json).unwrap(), module().manifest());
    }
}
