// ==========================================
// 禽场生产跟踪系统 - 配置读取 Trait
// ==========================================
// 职责: 定义应用启动所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::FarmDirectory;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// FarmConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait FarmConfigReader: Send + Sync {
    /// 状态 blob 的存储键
    ///
    /// # 默认值
    /// - poultryFarmData
    async fn get_storage_key(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// 是否启用远程活动日志
    ///
    /// # 默认值
    /// - false
    async fn is_remote_log_enabled(&self) -> Result<bool, Box<dyn Error + Send + Sync>>;

    /// 远程活动日志地址
    ///
    /// # 返回
    /// - None: 未配置
    async fn get_remote_log_endpoint(&self)
        -> Result<Option<String>, Box<dyn Error + Send + Sync>>;

    /// 远程请求超时（秒）
    ///
    /// # 默认值
    /// - 10
    async fn get_remote_log_timeout_secs(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 未单独配置场区的默认栋舍数
    ///
    /// # 默认值
    /// - 10
    async fn get_default_house_count(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 场区目录（场区名 -> 栋舍数）
    async fn get_farm_directory(&self) -> Result<FarmDirectory, Box<dyn Error + Send + Sync>>;
}
