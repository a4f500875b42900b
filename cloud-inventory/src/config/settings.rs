use std::env;
use std::path::PathBuf;

use cloud_inventory_pipeline::SyncPolicy;

use crate::AppError;

/// Default snapshot directory for the file-backed source.
const DEFAULT_SNAPSHOT_DIR: &str = "./snapshots";

/// Default PostgreSQL pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub snapshot_dir: PathBuf,
    pub access_token: Option<String>,
    pub policy: SyncPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            access_token: None,
            policy: SyncPolicy::default(),
        }
    }
}

impl Settings {
    /// Reads settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL URL (default: unset, in-memory store)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `SNAPSHOT_DIR`: snapshot directory (default: ./snapshots)
    /// - `INVENTORY_ACCESS_TOKEN`: static provider token (default: unset)
    /// - `EMIT_CREATE_EVENTS`: emit CREATE events (default: true)
    /// - `CASCADE_GROUP_DELETES`: prune resources of pruned groups (default: false)
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value.trim().parse::<u32>().map_err(|_| {
                AppError::config(format!("DATABASE_MAX_CONNECTIONS is not a number: {}", value))
            })?,
            Err(_) => defaults.max_connections,
        };
        let snapshot_dir = env::var("SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.snapshot_dir);
        let access_token = env::var("INVENTORY_ACCESS_TOKEN").ok();

        let policy = SyncPolicy {
            emit_create_events: bool_var(
                "EMIT_CREATE_EVENTS",
                defaults.policy.emit_create_events,
            )?,
            cascade_group_deletes: bool_var(
                "CASCADE_GROUP_DELETES",
                defaults.policy.cascade_group_deletes,
            )?,
        };

        Ok(Self {
            database_url,
            max_connections,
            snapshot_dir,
            access_token,
            policy,
        })
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool, AppError> {
    match env::var(name) {
        Ok(value) => parse_bool(&value)
            .ok_or_else(|| AppError::config(format!("{} is not a boolean: {}", name, value))),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
