use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    DeployflowError, Result,
    catalog::NodeCatalog,
    model::CatalogModel,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// number of workers executing runs, defaults to 10
    pub worker_number: u16,
    /// capacity of the queue of runs waiting for a worker, defaults to 100
    pub run_queue_size: usize,
    /// catalog config
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// seed file, TOML or JSON by extension; the bundled seed when unset
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_number: 10,
            run_queue_size: 100,
            catalog: CatalogConfig::default(),
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| DeployflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_number == 0 {
            return Err(DeployflowError::Config("worker_number must be at least 1".into()));
        }
        if self.run_queue_size == 0 {
            return Err(DeployflowError::Config("run_queue_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Loads the catalog named by `catalog.path`, or the bundled one.
    pub fn load_catalog(&self) -> Result<NodeCatalog> {
        let Some(path) = &self.catalog.path else {
            return NodeCatalog::builtin();
        };

        let data = fs::read_to_string(path).map_err(|e| DeployflowError::Config(format!("failed to load catalog file {:?}: {}", path, e)))?;
        let model = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => CatalogModel::from_json(&data)?,
            _ => CatalogModel::from_toml(&data)?,
        };
        NodeCatalog::from_model(&model)
    }
}

#[cfg(test)]
mod test {
    use crate::Config;

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        worker_number = 4
        run_queue_size = 16

        [catalog]
        path = "/etc/deployflow/catalog.toml"
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.worker_number, 4);
        assert_eq!(config.run_queue_size, 16);
        assert!(config.catalog.path.is_some());
        assert_eq!(config.catalog.path.unwrap().to_str(), Some("/etc/deployflow/catalog.toml"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.worker_number, 10);
        assert!(config.catalog.path.is_none());
        assert!(!config.load_catalog().unwrap().is_empty());
    }

    #[test]
    fn test_config_rejects_zero_workers() {
        assert!(Config::load_from_str("worker_number = 0").is_err());
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = Config::load_from_str("[catalog]\npath = \"/nonexistent/catalog.toml\"").unwrap();
        assert!(config.load_catalog().is_err());
    }
}
