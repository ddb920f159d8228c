use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use super::{
    attendance::MarkPolicy,
    config::{Config, DatabaseKind},
    database::{Database, MemoryDatabase, RedisDatabase},
    utils::password_digest,
};

pub struct AppState {
    pub policy: MarkPolicy,
    pub database: Arc<dyn Database>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Arc<Self>> {
        let database: Arc<dyn Database> = match config.database {
            DatabaseKind::Redis => {
                info!("Connecting to Redis at {}", config.redis_url);

                Arc::new(
                    RedisDatabase::connect(&config.redis_url)
                        .await
                        .context("failed to connect to Redis")?,
                )
            }
            DatabaseKind::Memory => {
                info!("Using in-memory database, records are lost on restart");

                Arc::new(MemoryDatabase::new())
            }
        };

        if let Some(password) = &config.teacher_password {
            info!("Seeding teacher credential");

            database
                .save_credential(&password_digest(password))
                .await
                .context("failed to seed teacher credential")?;
        }

        Ok(Self::with_database(config.policy, database))
    }

    pub fn with_database(policy: MarkPolicy, database: Arc<dyn Database>) -> Arc<Self> {
        Arc::new(Self { policy, database })
    }
}
