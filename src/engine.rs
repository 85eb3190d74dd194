use std::sync::Arc;

use tracing::info;

use crate::cache::{self, CacheStore};
use crate::catalog::{CatalogStore, MemoryCatalog};
use crate::cluster::{ClusterAssigner, ClusterState};
use crate::config::Config;
use crate::error::Result;
use crate::features::FeaturePipeline;
use crate::recommend::RecommendationResolver;
use crate::similarity::SimilarityMatrixBuilder;

/// The wired-up engine: one catalog, one cache, and the components sharing them.
#[derive(Clone)]
pub struct Engine {
    pub catalog: Arc<dyn CatalogStore>,
    pub cache: Arc<dyn CacheStore>,
    pub clusters: Arc<ClusterState>,
    pub similarity: Arc<SimilarityMatrixBuilder>,
    pub assigner: Arc<ClusterAssigner>,
    pub resolver: Arc<RecommendationResolver>,
}

impl Engine {
    pub fn new(config: &Config, catalog: Arc<dyn CatalogStore>, cache: Arc<dyn CacheStore>) -> Self {
        let pipeline = Arc::new(FeaturePipeline::new(&config.features));
        let clusters = Arc::new(ClusterState::new());

        let similarity = Arc::new(SimilarityMatrixBuilder::new(
            catalog.clone(),
            cache.clone(),
            pipeline.clone(),
            config.similarity.clone(),
        ));
        let assigner = Arc::new(ClusterAssigner::new(
            catalog.clone(),
            pipeline,
            clusters.clone(),
            config.clustering.clone(),
        ));
        let resolver = Arc::new(RecommendationResolver::new(
            catalog.clone(),
            similarity.clone(),
            clusters.clone(),
            config.recommend.rebuild_on_miss,
        ));

        Self {
            catalog,
            cache,
            clusters,
            similarity,
            assigner,
            resolver,
        }
    }

    /// Build the catalog and cache described by `config`, then wire the engine.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.catalog.path {
            Some(path) => MemoryCatalog::from_json_file(path).await?,
            None => MemoryCatalog::new(),
        };
        info!(movies = catalog.len(), "catalog loaded");

        let cache = cache::from_config(&config.cache).await?;
        let engine = Self::new(config, Arc::new(catalog), cache);

        if let Some(path) = &config.clustering.import_path {
            engine.assigner.load_from_file(path).await?;
        }
        Ok(engine)
    }
}
