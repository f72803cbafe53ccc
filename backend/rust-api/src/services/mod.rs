use std::path::Path;
use std::sync::Arc;

use crate::config::Config;

use catalog::ProblemCatalog;
use executor::{QueryExecutor, SqliteExecutor};
use history_service::QueryHistory;
use progress_service::ProgressTracker;
use query_gate::QueryGate;
use query_log::{MemoryQueryLogStore, MongoQueryLogStore, QueryLogStore};
use query_service::QueryService;
use storage::{KeyValueStore, MemoryStore, RedisStore};
use translator::ColumnTranslator;

pub mod catalog;
pub mod executor;
pub mod history_service;
pub mod progress_service;
pub mod query_gate;
pub mod query_log;
pub mod query_service;
pub mod storage;
pub mod translator;
pub mod validator;

pub struct AppState {
    pub config: Config,
    pub queries: QueryService,
    pub catalog: Arc<ProblemCatalog>,
    pub progress: ProgressTracker,
    pub history: QueryHistory,
    pub query_logs: Arc<dyn QueryLogStore>,
    pub kv: Arc<dyn KeyValueStore>,
}

impl AppState {
    /// Opens the dataset read-only and connects the optional stores named in
    /// `config`, falling back to in-memory ones.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let executor =
            SqliteExecutor::open_read_only(&config.dataset_path, config.query_timeout())?;

        let query_logs: Arc<dyn QueryLogStore> = match &config.mongo_uri {
            Some(uri) => {
                let client = mongodb::Client::with_uri_str(uri).await?;
                tracing::info!("MongoDB connected");
                Arc::new(MongoQueryLogStore::new(
                    client.database(&config.mongo_database),
                ))
            }
            None => {
                tracing::warn!("No MongoDB URI configured, keeping query logs in memory");
                Arc::new(MemoryQueryLogStore::new())
            }
        };

        let kv: Arc<dyn KeyValueStore> = match &config.redis_uri {
            Some(uri) => Arc::new(RedisStore::connect(uri).await?),
            None => {
                tracing::warn!("No Redis URI configured, keeping learner state in memory");
                Arc::new(MemoryStore::new())
            }
        };

        let catalog = ProblemCatalog::load(config.catalog_path.as_deref().map(Path::new))?;

        Self::with_components(config, Arc::new(executor), query_logs, kv, catalog)
    }

    /// Assembles state from already-built parts.
    pub fn with_components(
        config: Config,
        executor: Arc<dyn QueryExecutor>,
        query_logs: Arc<dyn QueryLogStore>,
        kv: Arc<dyn KeyValueStore>,
        catalog: ProblemCatalog,
    ) -> anyhow::Result<Self> {
        let queries = QueryService::new(
            QueryGate::new(config.table_name.clone(), config.row_limit),
            ColumnTranslator::stores()?,
            executor,
            query_logs.clone(),
        );
        let catalog = Arc::new(catalog);

        Ok(Self {
            progress: ProgressTracker::new(kv.clone(), catalog.clone()),
            history: QueryHistory::new(kv.clone()),
            config,
            queries,
            catalog,
            query_logs,
            kv,
        })
    }
}
