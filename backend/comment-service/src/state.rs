/// Service wiring: builds the store, broker and services from `Config`
use crate::config::{Config, SERVICE_NAME};
use crate::services::{CommentService, PostService};
use crate::storage::{self, PgCommentStore, StorageBackend};
use crate::subscription::SubscriptionBroker;
use anyhow::{anyhow, Context};
use db_pool::{create_pool, DbConfig};
use std::time::Duration;

/// Everything an embedding transport needs to serve requests
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub broker: SubscriptionBroker,
}

impl AppState {
    /// Load `.env`, read configuration from the environment and build the state
    pub async fn bootstrap() -> anyhow::Result<Self> {
        // Missing .env is fine; real deployments use the process environment.
        let _ = dotenvy::dotenv();

        let config = Config::from_env()
            .map_err(|e| anyhow!(e))
            .context("Failed to load configuration")?;

        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        tracing::info!(
            service = SERVICE_NAME,
            env = %config.app.env,
            storage = %config.storage.backend,
            "Initializing comment service"
        );

        let query_timeout = Duration::from_millis(config.database.query_timeout_ms);

        let pool = match config.storage.backend {
            StorageBackend::Postgres => {
                let url = config
                    .database
                    .url
                    .clone()
                    .context("DATABASE_URL is required for postgres storage")?;

                let db_cfg = DbConfig::with_url(SERVICE_NAME, url);
                db_cfg.log_config();
                let pool = create_pool(db_cfg)
                    .await
                    .context("Failed to create database pool")?;

                if config.database.run_migrations {
                    PgCommentStore::new(pool.clone(), query_timeout)
                        .run_migrations()
                        .await
                        .context("Failed to run database migrations")?;
                }
                Some(pool)
            }
            StorageBackend::Memory => {
                if config.is_production() {
                    tracing::warn!("In-memory storage selected in production; data is lost on restart");
                }
                None
            }
        };

        let store = storage::build_store(config.storage.backend, pool, query_timeout)
            .map_err(|e| anyhow!(e))
            .context("Failed to build comment store")?;

        let broker = SubscriptionBroker::new(config.subscriptions.mailbox_capacity);

        Ok(Self {
            post_service: PostService::new(store.clone()),
            comment_service: CommentService::new(store, broker.clone()),
            broker,
            config,
        })
    }
}
