use serde::{Deserialize, Serialize};

use crate::{DeployflowError, Result};

/// Seed table for the node catalog.
///
/// ```toml
/// [[node_types]]
/// type = "deploy"
/// name = "Deploy"
/// icon = { type = "icon", name = "cloud-upload" }
///
/// [[node_types.providers]]
/// type = "local"
/// name = "Local"
/// icon = { type = "image", name = "/imgs/providers/local.svg" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogModel {
    #[serde(default)]
    pub node_types: Vec<NodeTypeModel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeTypeModel {
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    #[serde(default)]
    pub icon: IconModel,
    /// Present for branch types, even when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<ProviderModel>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderModel {
    #[serde(rename = "type")]
    pub provider_type: String,
    pub name: String,
    #[serde(default)]
    pub icon: IconModel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IconModel {
    #[serde(rename = "type", default)]
    pub icon_type: String,
    #[serde(default)]
    pub name: String,
}

impl CatalogModel {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str::<CatalogModel>(s).map_err(|e| DeployflowError::Config(format!("invalid catalog json: {}", e)))
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str::<CatalogModel>(s).map_err(|e| DeployflowError::Config(format!("invalid catalog toml: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_toml() {
        let text = r#"
        [[node_types]]
        type = "notify"
        name = "Notify"
        icon = { type = "icon", name = "send" }

        [[node_types]]
        type = "deploy"
        name = "Deploy"
        providers = [
            { type = "aws", name = "AWS" },
            { type = "local", name = "Local" },
        ]
        "#;

        let model = CatalogModel::from_toml(text).unwrap();
        assert_eq!(model.node_types.len(), 2);
        assert_eq!(model.node_types[0].node_type, "notify");
        assert_eq!(model.node_types[0].icon.name, "send");
        assert!(model.node_types[0].providers.is_none());

        let providers = model.node_types[1].providers.as_ref().unwrap();
        assert_eq!(providers.iter().map(|p| p.provider_type.as_str()).collect::<Vec<_>>(), vec!["aws", "local"]);
    }

    #[test]
    fn test_catalog_from_json() {
        let text = r#"{"node_types":[{"type":"deploy","name":"Deploy","providers":[]}]}"#;
        let model = CatalogModel::from_json(text).unwrap();
        assert_eq!(model.node_types[0].providers, Some(vec![]));
    }

    #[test]
    fn test_catalog_invalid_text() {
        let err = CatalogModel::from_json("{").unwrap_err();
        assert!(matches!(err, DeployflowError::Config(_)));
    }
}
