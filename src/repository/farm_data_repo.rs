// ==========================================
// 禽场生产跟踪系统 - 状态 blob 仓储
// ==========================================
// 职责: 在 local_storage 表中按存储键读写整份状态 JSON
// 红线: Repository 不做业务逻辑（迁移/合并在引擎层）
// ==========================================

use crate::engine::FarmData;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct FarmDataRepository {
    conn: Arc<Mutex<Connection>>,
    storage_key: String,
}

impl FarmDataRepository {
    pub fn new(conn: Arc<Mutex<Connection>>, storage_key: &str) -> Self {
        Self {
            conn,
            storage_key: storage_key.to_string(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取原始 JSON
    ///
    /// # 返回
    /// - Ok(None): 尚未保存过
    pub fn load_raw(&self) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![self.storage_key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(raw)
    }

    /// 写入原始 JSON（覆盖）
    pub fn save_raw(&self, raw: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO local_storage (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![self.storage_key, raw],
        )?;
        Ok(())
    }

    /// 保存快照
    pub fn save(&self, data: &FarmData) -> RepositoryResult<()> {
        let raw = data.to_json()?;
        self.save_raw(&raw)?;
        tracing::debug!(storage_key = %self.storage_key, bytes = raw.len(), "状态已保存");
        Ok(())
    }

    /// 备份原始 JSON 到 `<存储键>.corrupt.<时间戳>`，返回备份键
    ///
    /// 用于加载时发现无法完整解析的数据，避免下次保存覆盖原始内容
    pub fn save_backup(&self, raw: &str, now: DateTime<Utc>) -> RepositoryResult<String> {
        let backup_key = format!(
            "{}.corrupt.{}",
            self.storage_key,
            now.format("%Y%m%dT%H%M%S%.3f")
        );
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO local_storage (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![backup_key, raw],
        )?;
        Ok(backup_key)
    }

    /// 列出本存储键下的备份键（按键名升序）
    pub fn backup_keys(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM local_storage WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let prefix = format!("{}.corrupt.", self.storage_key);
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// 删除已保存的状态
    pub fn clear(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM local_storage WHERE key = ?1",
            params![self.storage_key],
        )?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn memory_repo(key: &str) -> FarmDataRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        FarmDataRepository::new(Arc::new(Mutex::new(conn)), key)
    }

    #[test]
    fn test_load_before_save_is_none() {
        let repo = memory_repo("poultryFarmData");
        assert_eq!(repo.load_raw().unwrap(), None);
    }

    #[test]
    fn test_save_overwrites() {
        let repo = memory_repo("poultryFarmData");
        repo.save_raw("{\"a\":1}").unwrap();
        repo.save_raw("{\"a\":2}").unwrap();
        assert_eq!(repo.load_raw().unwrap().as_deref(), Some("{\"a\":2}"));
        assert_eq!(repo.clear().unwrap(), 1);
        assert_eq!(repo.load_raw().unwrap(), None);
    }

    #[test]
    fn test_backup_kept_under_separate_key() {
        let repo = memory_repo("poultryFarmData");
        repo.save_raw("{\"cycles\":\"bad\"}").unwrap();

        let now = chrono::Utc::now();
        let key = repo.save_backup("{\"cycles\":\"bad\"}", now).unwrap();
        assert!(key.starts_with("poultryFarmData.corrupt."));

        repo.save_raw("{}").unwrap();
        assert_eq!(repo.backup_keys().unwrap(), vec![key]);
        assert_eq!(repo.load_raw().unwrap().as_deref(), Some("{}"));

        // 其他存储键的备份互不可见
        let other = FarmDataRepository::new(repo.conn.clone(), "otherKey");
        assert!(other.backup_keys().unwrap().is_empty());
    }

    #[test]
    fn test_save_snapshot_is_parseable() {
        let repo = memory_repo("k");
        repo.save(&FarmData::default()).unwrap();
        let raw = repo.load_raw().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["users"]["admin"].is_object());
    }
}
