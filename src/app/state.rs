// ==========================================
// 禽场生产跟踪系统 - 应用状态
// ==========================================
// 职责: 组装配置、仓储、活动上报与各 API 实例
// 加载: 读取状态 blob -> 解析并迁移旧版数据 -> 失败时回落默认数据
// ==========================================

use crate::api::{AdminApi, BackupApi, CycleApi, FarmStateHandle, ImportApi, RecordApi};
use crate::app::remote_log::HttpActivityPublisher;
use crate::config::{ConfigManager, FarmConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::FarmDirectory;
use crate::engine::{
    ActivityPublisher, FarmData, MigrationReport, NoOpActivityPublisher, UserMergePolicy,
};
use crate::repository::FarmDataRepository;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 应用状态
///
/// 持有唯一的状态快照句柄与所有 API 实例
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 批次 API
    pub cycle_api: Arc<CycleApi>,

    /// 批次记录 API
    pub record_api: Arc<RecordApi>,

    /// CSV 导入 API
    pub import_api: Arc<ImportApi>,

    /// 备份导入导出 API
    pub backup_api: Arc<BackupApi>,

    /// 用户/通知/维护模式 API
    pub admin_api: Arc<AdminApi>,

    /// 启动加载时的旧版迁移统计
    pub migration_report: MigrationReport,

    state: Arc<FarmStateHandle>,

    /// 按配置启用的远程活动日志（用于退出前 flush）
    remote_log: Option<Arc<HttpActivityPublisher>>,
}

impl AppState {
    /// 打开应用状态，活动上报按配置决定
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub async fn open(db_path: &str) -> Result<Self, String> {
        Self::open_with_publisher(db_path, None).await
    }

    /// 打开应用状态
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - publisher: 指定活动发布者；None 时按配置创建
    pub async fn open_with_publisher(
        db_path: &str,
        publisher: Option<Arc<dyn ActivityPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let storage_key = config
            .get_storage_key()
            .await
            .map_err(|e| format!("读取存储键失败: {}", e))?;
        let directory = config.get_farm_directory().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "读取场区配置失败，使用默认栋舍数");
            FarmDirectory::default()
        });

        let (publisher, remote_log) = match publisher {
            Some(p) => (p, None),
            None => match Self::remote_log_from_config(&config).await {
                Some(remote) => (remote.clone() as Arc<dyn ActivityPublisher>, Some(remote)),
                None => (Arc::new(NoOpActivityPublisher) as Arc<dyn ActivityPublisher>, None),
            },
        };

        // ==========================================
        // 加载状态
        // ==========================================
        let repo = Arc::new(FarmDataRepository::new(conn, &storage_key));
        let (data, migration_report) = Self::load_farm_data(&repo);

        let state = Arc::new(FarmStateHandle::new(data, repo, publisher, directory));

        tracing::info!(
            storage_key = %storage_key,
            migrated = migration_report.migrated(),
            "AppState初始化完成"
        );

        Ok(Self {
            db_path: db_path.to_string(),
            config,
            cycle_api: Arc::new(CycleApi::new(state.clone())),
            record_api: Arc::new(RecordApi::new(state.clone())),
            import_api: Arc::new(ImportApi::new(state.clone())),
            backup_api: Arc::new(BackupApi::new(state.clone())),
            admin_api: Arc::new(AdminApi::new(state.clone())),
            migration_report,
            state,
            remote_log,
        })
    }

    /// 当前快照副本
    pub fn snapshot(&self) -> Result<FarmData, String> {
        self.state.snapshot().map_err(|e| e.to_string())
    }

    pub fn farm_directory(&self) -> &FarmDirectory {
        self.state.directory()
    }

    /// 等待远程活动日志发送完毕（未启用时直接返回 true）
    pub async fn flush_activity_log(&self, timeout: Duration) -> bool {
        match &self.remote_log {
            Some(remote) => remote.flush(timeout).await,
            None => true,
        }
    }

    /// 读取并解析已保存的状态
    ///
    /// 解析失败时回落为默认数据；发生迁移时立即写回新形态
    /// 解析失败或跳过了格式错误的条目时，先把原始 JSON 备份到独立的键
    fn load_farm_data(repo: &FarmDataRepository) -> (FarmData, MigrationReport) {
        let raw = match repo.load_raw() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!("未找到已保存的数据，使用默认数据");
                return (FarmData::default(), MigrationReport::default());
            }
            Err(e) => {
                tracing::warn!(error = %e, "读取已保存数据失败，使用默认数据");
                return (FarmData::default(), MigrationReport::default());
            }
        };

        match FarmData::from_json(&raw, UserMergePolicy::AsStored) {
            Ok((data, report)) => {
                if report.skipped_malformed > 0 {
                    Self::backup_raw(repo, &raw);
                }
                if report.migrated() > 0 {
                    if let Err(e) = repo.save(&data) {
                        tracing::warn!(error = %e, "迁移后数据写回失败");
                    }
                }
                (data, report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "已保存数据解析失败，使用默认数据");
                Self::backup_raw(repo, &raw);
                (FarmData::default(), MigrationReport::default())
            }
        }
    }

    fn backup_raw(repo: &FarmDataRepository, raw: &str) {
        match repo.save_backup(raw, chrono::Utc::now()) {
            Ok(key) => tracing::warn!(backup_key = %key, "原始数据已备份"),
            Err(e) => tracing::error!(error = %e, "原始数据备份失败"),
        }
    }

    async fn remote_log_from_config(config: &ConfigManager) -> Option<Arc<HttpActivityPublisher>> {
        let enabled = config.is_remote_log_enabled().await.unwrap_or(false);
        let endpoint = config.get_remote_log_endpoint().await.ok().flatten();

        match (enabled, endpoint) {
            (true, Some(endpoint)) => {
                let timeout = config
                    .get_remote_log_timeout_secs()
                    .await
                    .unwrap_or(crate::config::config_manager::DEFAULT_REMOTE_LOG_TIMEOUT_SECS);
                match HttpActivityPublisher::new(&endpoint, timeout) {
                    Ok(publisher) => {
                        tracing::info!(endpoint = %endpoint, "远程活动日志已启用");
                        Some(Arc::new(publisher))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "远程活动日志客户端创建失败，已禁用");
                        None
                    }
                }
            }
            (true, None) => {
                tracing::warn!("远程活动日志已启用但未配置端点，已禁用");
                None
            }
            _ => None,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 POULTRY_FARM_DB_PATH，其次为用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("POULTRY_FARM_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./poultry_farm.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("poultry-farm-tracker");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("poultry_farm.db");
        }
    }

    path.to_string_lossy().to_string()
}
