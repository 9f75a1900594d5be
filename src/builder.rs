use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::{Config, DeployflowError, Engine, NodeExecutor, Result, catalog::NodeCatalog};

pub struct EngineBuilder {
    config: Config,
    catalog: Option<Arc<NodeCatalog>>,
    executor: Option<Arc<dyn NodeExecutor>>,
    rt: Option<Arc<Runtime>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            catalog: None,
            executor: None,
            rt: None,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn worker_number(
        mut self,
        n: u16,
    ) -> Self {
        self.config.worker_number = n;
        self
    }

    /// Uses `catalog` instead of the one named by the config.
    pub fn catalog(
        mut self,
        catalog: Arc<NodeCatalog>,
    ) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn executor(
        mut self,
        executor: Arc<dyn NodeExecutor>,
    ) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    pub fn build(&self) -> Result<Engine> {
        self.config.validate()?;

        let executor = self.executor.clone().ok_or_else(|| DeployflowError::Engine("a node executor is required".into()))?;
        let catalog = match &self.catalog {
            Some(catalog) => catalog.clone(),
            None => Arc::new(self.config.load_catalog()?),
        };
        let runtime = match &self.rt {
            Some(rt) => rt.clone(),
            None => Arc::new(Builder::new_multi_thread().worker_threads(self.config.worker_number.into()).enable_all().build()?),
        };

        Ok(Engine::new(self.config.clone(), catalog, executor, runtime))
    }
}
