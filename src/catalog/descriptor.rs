use serde::{Deserialize, Serialize};

/// How a menu or node renders its icon.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IconType {
    /// A named glyph from the host's icon set.
    #[default]
    Icon,
    /// An image path or url.
    Image,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct IconDescriptor {
    #[serde(rename = "type")]
    pub icon_type: IconType,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// provider type code, e.g. `aliyun-cdn`
    pub provider_type: String,
    /// display name
    pub name: String,
    pub icon: IconDescriptor,
}

/// Leaf types are used as-is; branch types must be narrowed by a provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "providers", rename_all = "snake_case")]
pub enum NodeKind {
    Leaf,
    Branch(Vec<ProviderDescriptor>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeDescriptor {
    /// node type code, e.g. `deploy`
    pub node_type: String,
    /// display name
    pub name: String,
    pub icon: IconDescriptor,
    pub kind: NodeKind,
}

impl NodeTypeDescriptor {
    pub fn is_branch(&self) -> bool {
        matches!(self.kind, NodeKind::Branch(_))
    }

    /// Providers registered for this type, empty for leaf types.
    pub fn providers(&self) -> &[ProviderDescriptor] {
        match &self.kind {
            NodeKind::Leaf => &[],
            NodeKind::Branch(providers) => providers,
        }
    }

    pub fn provider(
        &self,
        provider_type: &str,
    ) -> Option<&ProviderDescriptor> {
        self.providers().iter().find(|p| p.provider_type == provider_type)
    }
}
