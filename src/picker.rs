//! Searchable index over the providers of one branch node type.

use crate::{
    catalog::{NodeCatalog, ProviderDescriptor},
    graph::AddNodeCommand,
};

struct Entry {
    provider: ProviderDescriptor,
    type_key: String,
    name_key: String,
}

/// Read-only provider index. Searching never fails; no match is an empty result.
pub struct ProviderPicker {
    node_type: String,
    entries: Vec<Entry>,
}

impl ProviderPicker {
    /// Indexes the providers of `node_type`. Leaf and unknown types yield an empty index.
    pub fn new(
        catalog: &NodeCatalog,
        node_type: &str,
    ) -> Self {
        let entries = catalog
            .list_providers(node_type)
            .iter()
            .map(|provider| Entry {
                type_key: provider.provider_type.to_lowercase(),
                name_key: provider.name.to_lowercase(),
                provider: provider.clone(),
            })
            .collect();

        Self {
            node_type: node_type.to_string(),
            entries,
        }
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Providers whose type code or display name contains `keyword`, ignoring case.
    ///
    /// The keyword is trimmed; an empty keyword returns every provider in registration order.
    pub fn search(
        &self,
        keyword: &str,
    ) -> Vec<&ProviderDescriptor> {
        let keyword = keyword.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| keyword.is_empty() || e.type_key.contains(&keyword) || e.name_key.contains(&keyword))
            .map(|e| &e.provider)
            .collect()
    }

    /// Forwards the chosen provider type unchanged.
    pub fn select<'a>(
        &self,
        provider_type: &'a str,
    ) -> &'a str {
        provider_type
    }

    /// Turns a chosen provider into an insert request under `parent_id`.
    ///
    /// The provider is validated when the command is applied, not here.
    pub fn resolve(
        &self,
        provider_type: &str,
        parent_id: &str,
    ) -> AddNodeCommand {
        AddNodeCommand::new(self.node_type.clone(), Some(self.select(provider_type).to_string()), parent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;

    fn codes(found: Vec<&ProviderDescriptor>) -> Vec<String> {
        found.into_iter().map(|p| p.provider_type.clone()).collect()
    }

    #[test]
    fn test_empty_keyword_returns_all() {
        let picker = ProviderPicker::new(&sample_catalog(), "deploy");
        assert_eq!(codes(picker.search("")), vec!["aws", "local"]);
        assert_eq!(codes(picker.search("   ")), vec!["aws", "local"]);
    }

    #[test]
    fn test_search_matches_code_and_name() {
        let picker = ProviderPicker::new(&sample_catalog(), "deploy");
        assert_eq!(codes(picker.search("AWS")), vec!["aws"]);
        assert_eq!(codes(picker.search("host")), vec!["local"]);
        assert_eq!(codes(picker.search("a")), vec!["aws", "local"]);
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let picker = ProviderPicker::new(&sample_catalog(), "deploy");
        assert!(picker.search("gcp").is_empty());
    }

    #[test]
    fn test_search_is_subset_of_all() {
        let picker = ProviderPicker::new(&NodeCatalog::builtin().unwrap(), "deploy");
        let all = codes(picker.search(""));
        for keyword in ["cdn", "Cloud", "SSH", "x", "aliyun"] {
            let found = picker.search(keyword);
            let lower = keyword.to_lowercase();
            for p in &found {
                assert!(p.provider_type.to_lowercase().contains(&lower) || p.name.to_lowercase().contains(&lower));
            }
            // registration order is kept
            let positions: Vec<_> = found.iter().map(|p| all.iter().position(|c| *c == p.provider_type).unwrap()).collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_leaf_type_has_no_providers() {
        let picker = ProviderPicker::new(&sample_catalog(), "webhook");
        assert!(picker.is_empty());
        assert!(picker.search("").is_empty());
    }

    #[test]
    fn test_select_and_resolve() {
        let picker = ProviderPicker::new(&sample_catalog(), "deploy");
        assert_eq!(picker.select("local"), "local");
        assert_eq!(picker.resolve("local", "root"), AddNodeCommand::new("deploy", Some("local".into()), "root"));
    }
}
