use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    Mock,
    #[default]
    Live,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
    Memory,
}

/// 検証できないキュー項目（poison mutation）の扱い
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoisonPolicy {
    /// dead letter リストへ移してから先頭を外す
    #[default]
    Quarantine,
    /// ログだけ残して破棄する
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: AppMode,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub sync_on_session: bool,
    pub drain_on_reconnect: bool,
    pub clear_queue_on_sign_out: bool,
    pub poison_policy: PoisonPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: AppMode::Live,
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                data_dir: "./data".to_string(),
                database_url: "sqlite:data/feedline.db".to_string(),
                max_connections: 5,
            },
            sync: SyncConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_on_session: true,
            drain_on_reconnect: false,
            clear_queue_on_sign_out: true,
            poison_policy: PoisonPolicy::Quarantine,
        }
    }
}

impl StorageConfig {
    pub fn offline_images_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("offline-images")
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        // 既定値
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FEEDLINE_APP_MODE") {
            cfg.mode = match v.trim().to_ascii_lowercase().as_str() {
                "mock" => AppMode::Mock,
                "live" | "prod" => AppMode::Live,
                _ => cfg.mode,
            };
        }

        if let Ok(v) = std::env::var("FEEDLINE_STORAGE_BACKEND") {
            cfg.storage.backend = match v.trim().to_ascii_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "file" => StorageBackend::File,
                "memory" => StorageBackend::Memory,
                _ => cfg.storage.backend,
            };
        }
        if let Ok(v) = std::env::var("FEEDLINE_DATA_DIR") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.storage.data_dir = trimmed.to_string();
                cfg.storage.database_url = format!("sqlite:{}/feedline.db", trimmed);
            }
        } else if let Some(dir) = dirs::data_local_dir() {
            let data_dir = dir.join("feedline");
            cfg.storage.data_dir = data_dir.display().to_string();
            cfg.storage.database_url = format!("sqlite:{}", data_dir.join("feedline.db").display());
        }
        if let Ok(v) = std::env::var("FEEDLINE_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.storage.database_url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("FEEDLINE_DB_MAX_CONNECTIONS")
            && let Some(value) = parse_u32(&v)
        {
            cfg.storage.max_connections = value;
        }

        if let Ok(v) = std::env::var("FEEDLINE_SYNC_ON_SESSION") {
            cfg.sync.sync_on_session = parse_bool(&v, cfg.sync.sync_on_session);
        }
        if let Ok(v) = std::env::var("FEEDLINE_SYNC_ON_RECONNECT") {
            cfg.sync.drain_on_reconnect = parse_bool(&v, cfg.sync.drain_on_reconnect);
        }
        if let Ok(v) = std::env::var("FEEDLINE_CLEAR_QUEUE_ON_SIGN_OUT") {
            cfg.sync.clear_queue_on_sign_out = parse_bool(&v, cfg.sync.clear_queue_on_sign_out);
        }
        if let Ok(v) = std::env::var("FEEDLINE_POISON_POLICY") {
            cfg.sync.poison_policy = match v.trim().to_ascii_lowercase().as_str() {
                "quarantine" => PoisonPolicy::Quarantine,
                "drop" => PoisonPolicy::Drop,
                _ => cfg.sync.poison_policy,
            };
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage.data_dir.trim().is_empty() {
            return Err("Storage data_dir must not be empty".to_string());
        }
        if self.storage.backend == StorageBackend::Sqlite {
            if self.storage.max_connections == 0 {
                return Err("Storage max_connections must be greater than 0".to_string());
            }
            if !self.storage.database_url.starts_with("sqlite:") {
                return Err("Storage database_url must be a sqlite url".to_string());
            }
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sync.poison_policy, PoisonPolicy::Quarantine);
        assert!(!cfg.sync.drain_on_reconnect);
        assert!(cfg.sync.clear_queue_on_sign_out);
    }

    #[test]
    fn validate_rejects_zero_connections() {
        let mut cfg = AppConfig::default();
        cfg.storage.max_connections = 0;
        assert!(cfg.validate().is_err());

        cfg.storage.backend = StorageBackend::Memory;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_bool_falls_back_to_default() {
        assert!(parse_bool("YES", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("maybe", true));
    }

    #[test]
    fn offline_images_dir_lives_under_data_dir() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.storage.offline_images_dir(),
            PathBuf::from("./data").join("offline-images")
        );
    }
}
