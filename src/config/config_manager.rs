// ==========================================
// 禽场生产跟踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (scope_id='global')
// ==========================================

use crate::config::farm_config_trait::FarmConfigReader;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::{FarmDirectory, DEFAULT_HOUSE_COUNT};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigError = Box<dyn Error + Send + Sync>;

/// 默认存储键
pub const DEFAULT_STORAGE_KEY: &str = "poultryFarmData";

/// 默认远程请求超时（秒）
pub const DEFAULT_REMOTE_LOG_TIMEOUT_SECS: u64 = 10;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.get_config_value(key)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 设置单个场区的栋舍数
    pub fn set_farm_house_count(&self, farm_name: &str, house_count: usize) -> Result<(), ConfigError> {
        let mut counts = self.read_farm_house_counts()?;
        counts.insert(farm_name.to_string(), house_count);
        let raw = serde_json::to_string(&counts)?;
        self.set_config_value(config_keys::FARM_HOUSE_COUNTS, &raw)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 场区栋舍数配置
    ///
    /// 配置格式为 JSON: {"Farm 1": 10, "Farm 2": 12}
    /// 格式错误时返回空表并告警
    fn read_farm_house_counts(&self) -> Result<BTreeMap<String, usize>, ConfigError> {
        let value = self.get_config_or_default(config_keys::FARM_HOUSE_COUNTS, "{}")?;
        let counts: BTreeMap<String, usize> = serde_json::from_str(&value).unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::FARM_HOUSE_COUNTS,
                raw_value = %value,
                "场区栋舍数配置格式错误，使用空配置"
            );
            BTreeMap::new()
        });
        Ok(counts)
    }
}

// ==========================================
// FarmConfigReader Trait 实现
// ==========================================
#[async_trait]
impl FarmConfigReader for ConfigManager {
    async fn get_storage_key(&self) -> Result<String, ConfigError> {
        let value = self.get_config_or_default(config_keys::STORAGE_KEY, DEFAULT_STORAGE_KEY)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(DEFAULT_STORAGE_KEY.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    async fn is_remote_log_enabled(&self) -> Result<bool, ConfigError> {
        let value = self.get_config_or_default(config_keys::REMOTE_LOG_ENABLED, "false")?;
        Ok(matches!(
            value.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ))
    }

    async fn get_remote_log_endpoint(&self) -> Result<Option<String>, ConfigError> {
        Ok(self
            .get_config_value(config_keys::REMOTE_LOG_ENDPOINT)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    async fn get_remote_log_timeout_secs(&self) -> Result<u64, ConfigError> {
        let value = self.get_config_or_default(
            config_keys::REMOTE_LOG_TIMEOUT_SECS,
            &DEFAULT_REMOTE_LOG_TIMEOUT_SECS.to_string(),
        )?;
        Ok(value.trim().parse::<u64>().unwrap_or(DEFAULT_REMOTE_LOG_TIMEOUT_SECS))
    }

    async fn get_default_house_count(&self) -> Result<usize, ConfigError> {
        let value = self.get_config_or_default(
            config_keys::DEFAULT_HOUSE_COUNT,
            &DEFAULT_HOUSE_COUNT.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_HOUSE_COUNT))
    }

    async fn get_farm_directory(&self) -> Result<FarmDirectory, ConfigError> {
        let default_house_count = self.get_default_house_count().await?;
        let counts = self
            .read_farm_house_counts()?
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .collect();
        Ok(FarmDirectory::new(default_house_count, counts))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 本地存储
    pub const STORAGE_KEY: &str = "storage_key";

    // 远程活动日志
    pub const REMOTE_LOG_ENABLED: &str = "remote_log_enabled";
    pub const REMOTE_LOG_ENDPOINT: &str = "remote_log_endpoint";
    pub const REMOTE_LOG_TIMEOUT_SECS: &str = "remote_log_timeout_secs";

    // 场区
    pub const DEFAULT_HOUSE_COUNT: &str = "default_house_count";
    pub const FARM_HOUSE_COUNTS: &str = "farm_house_counts"; // JSON
}
