//! # Store
//!
//! Sole owner of all mutable state. The server keeps nothing in-process beyond config.
//!
//! ## Redis Layout
//!
//! - `attendance:users`: set of known roll numbers
//! - `attendance:results`: hash of roll number to JSON [`AttendanceRecord`]
//! - `attendance:teacher`: hash with `password` (hex SHA-256) and `allowed` (`"1"` or `"0"`)
//!
//! One big key per entity keeps lookups O(1) and the dataset easy to inspect with `redis-cli`.
//!
//! ## Memory
//!
//! [`MemoryDatabase`] mirrors the same operations behind a lock. Meant for local runs
//! and tests, everything is lost on restart.
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tokio::sync::RwLock;

use crate::{
    error::DatabaseError,
    models::{AttendanceRecord, TeacherCredential},
};

pub const USERS_KEY: &str = "attendance:users";
pub const RESULTS_KEY: &str = "attendance:results";
pub const TEACHER_KEY: &str = "attendance:teacher";

const PASSWORD_FIELD: &str = "password";
const ALLOWED_FIELD: &str = "allowed";

#[async_trait]
pub trait Database: Send + Sync {
    async fn user_exists(&self, roll_number: &str) -> Result<bool, DatabaseError>;

    /// Returns how many of `roll_numbers` were not already known.
    async fn add_users(&self, roll_numbers: &[String]) -> Result<usize, DatabaseError>;

    async fn users(&self) -> Result<Vec<String>, DatabaseError>;

    async fn result(&self, roll_number: &str) -> Result<Option<AttendanceRecord>, DatabaseError>;

    async fn save_result(&self, record: &AttendanceRecord) -> Result<(), DatabaseError>;

    /// All records ordered by roll number.
    async fn results(&self) -> Result<Vec<AttendanceRecord>, DatabaseError>;

    async fn credential(&self) -> Result<Option<TeacherCredential>, DatabaseError>;

    /// Replaces the password digest, leaving the open flag as is.
    async fn save_credential(&self, password_digest: &str) -> Result<(), DatabaseError>;

    async fn accessible(&self) -> Result<bool, DatabaseError>;

    async fn set_accessible(&self, open: bool) -> Result<(), DatabaseError>;
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, DatabaseError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Some(Duration::from_millis(100)));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

pub struct RedisDatabase {
    connection: ConnectionManager,
}

impl RedisDatabase {
    pub async fn connect(redis_url: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            connection: init_redis(redis_url).await?,
        })
    }
}

#[async_trait]
impl Database for RedisDatabase {
    async fn user_exists(&self, roll_number: &str) -> Result<bool, DatabaseError> {
        let mut connection = self.connection.clone();

        Ok(connection.sismember(USERS_KEY, roll_number).await?)
    }

    async fn add_users(&self, roll_numbers: &[String]) -> Result<usize, DatabaseError> {
        if roll_numbers.is_empty() {
            return Ok(0);
        }

        let mut connection = self.connection.clone();

        Ok(connection.sadd(USERS_KEY, roll_numbers.to_vec()).await?)
    }

    async fn users(&self) -> Result<Vec<String>, DatabaseError> {
        let mut connection = self.connection.clone();
        let mut users: Vec<String> = connection.smembers(USERS_KEY).await?;
        users.sort();

        Ok(users)
    }

    async fn result(&self, roll_number: &str) -> Result<Option<AttendanceRecord>, DatabaseError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.hget(RESULTS_KEY, roll_number).await?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(DatabaseError::from)
    }

    async fn save_result(&self, record: &AttendanceRecord) -> Result<(), DatabaseError> {
        let mut connection = self.connection.clone();
        let json = serde_json::to_string(record)?;

        let _: () = connection
            .hset(RESULTS_KEY, record.roll_number.as_str(), json)
            .await?;

        Ok(())
    }

    async fn results(&self) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        let mut connection = self.connection.clone();
        let raw: BTreeMap<String, String> = connection.hgetall(RESULTS_KEY).await?;

        raw.values()
            .map(|json| serde_json::from_str(json).map_err(DatabaseError::from))
            .collect()
    }

    async fn credential(&self) -> Result<Option<TeacherCredential>, DatabaseError> {
        let mut connection = self.connection.clone();
        let fields: BTreeMap<String, String> = connection.hgetall(TEACHER_KEY).await?;

        Ok(fields
            .get(PASSWORD_FIELD)
            .map(|password_digest| TeacherCredential {
                password_digest: password_digest.clone(),
                allowed: fields.get(ALLOWED_FIELD).is_some_and(|v| v == "1"),
            }))
    }

    async fn save_credential(&self, password_digest: &str) -> Result<(), DatabaseError> {
        let mut connection = self.connection.clone();

        let _: () = connection
            .hset(TEACHER_KEY, PASSWORD_FIELD, password_digest)
            .await?;

        Ok(())
    }

    async fn accessible(&self) -> Result<bool, DatabaseError> {
        let mut connection = self.connection.clone();
        let allowed: Option<String> = connection.hget(TEACHER_KEY, ALLOWED_FIELD).await?;

        Ok(allowed.is_some_and(|v| v == "1"))
    }

    async fn set_accessible(&self, open: bool) -> Result<(), DatabaseError> {
        let mut connection = self.connection.clone();
        let flag = if open { "1" } else { "0" };

        let _: () = connection.hset(TEACHER_KEY, ALLOWED_FIELD, flag).await?;

        Ok(())
    }
}

#[derive(Default)]
struct MemoryData {
    users: BTreeSet<String>,
    results: BTreeMap<String, AttendanceRecord>,
    password_digest: Option<String>,
    allowed: bool,
}

#[derive(Default)]
pub struct MemoryDatabase {
    data: RwLock<MemoryData>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_exists(&self, roll_number: &str) -> Result<bool, DatabaseError> {
        Ok(self.data.read().await.users.contains(roll_number))
    }

    async fn add_users(&self, roll_numbers: &[String]) -> Result<usize, DatabaseError> {
        let mut data = self.data.write().await;

        Ok(roll_numbers
            .iter()
            .filter(|roll_number| data.users.insert((*roll_number).clone()))
            .count())
    }

    async fn users(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.data.read().await.users.iter().cloned().collect())
    }

    async fn result(&self, roll_number: &str) -> Result<Option<AttendanceRecord>, DatabaseError> {
        Ok(self.data.read().await.results.get(roll_number).cloned())
    }

    async fn save_result(&self, record: &AttendanceRecord) -> Result<(), DatabaseError> {
        self.data
            .write()
            .await
            .results
            .insert(record.roll_number.clone(), record.clone());

        Ok(())
    }

    async fn results(&self) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        Ok(self.data.read().await.results.values().cloned().collect())
    }

    async fn credential(&self) -> Result<Option<TeacherCredential>, DatabaseError> {
        let data = self.data.read().await;

        Ok(data
            .password_digest
            .as_ref()
            .map(|password_digest| TeacherCredential {
                password_digest: password_digest.clone(),
                allowed: data.allowed,
            }))
    }

    async fn save_credential(&self, password_digest: &str) -> Result<(), DatabaseError> {
        self.data.write().await.password_digest = Some(password_digest.to_string());

        Ok(())
    }

    async fn accessible(&self) -> Result<bool, DatabaseError> {
        Ok(self.data.read().await.allowed)
    }

    async fn set_accessible(&self, open: bool) -> Result<(), DatabaseError> {
        self.data.write().await.allowed = open;

        Ok(())
    }
}
