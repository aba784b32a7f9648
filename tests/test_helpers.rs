// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、应用状态构建、样例批次与 CSV 文件
// ==========================================

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use poultry_farm_tracker::app::AppState;
use poultry_farm_tracker::db::{ensure_schema, open_sqlite_connection};
use poultry_farm_tracker::domain::{FarmCycleEntry, NewCycle};
use poultry_farm_tracker::engine::RecordingActivityPublisher;
use poultry_farm_tracker::repository::FarmDataRepository;
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::{Builder, NamedTempFile};

pub const STORAGE_KEY: &str = "poultryFarmData";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开应用状态，活动事件记录在内存中
pub async fn open_app(db_path: &str) -> (AppState, RecordingActivityPublisher) {
    let publisher = RecordingActivityPublisher::new();
    let app = AppState::open_with_publisher(db_path, Some(Arc::new(publisher.clone())))
        .await
        .expect("Failed to open AppState");
    (app, publisher)
}

/// 直接写入原始状态 blob（模拟旧版本保存的数据）
pub fn seed_raw_blob(db_path: &str, raw: &str) -> Result<(), Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;
    let repo = FarmDataRepository::new(Arc::new(Mutex::new(conn)), STORAGE_KEY);
    repo.save_raw(raw)?;
    Ok(())
}

/// 读取原始状态 blob
pub fn load_raw_blob(db_path: &str) -> Result<Option<String>, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    let repo = FarmDataRepository::new(Arc::new(Mutex::new(conn)), STORAGE_KEY);
    Ok(repo.load_raw()?)
}

/// 固定时刻（便于断言批次 id）
pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// 样例批次: 各场区 cropNo 取序号
pub fn sample_new_cycle(cycle_no: &str, farms: &[(&str, &str)]) -> NewCycle {
    NewCycle {
        cycle_no: cycle_no.to_string(),
        farms: farms
            .iter()
            .enumerate()
            .map(|(i, (farm, start))| FarmCycleEntry::new(farm, &(i + 1).to_string(), start))
            .collect(),
    }
}

/// 写入临时 CSV 文件
pub fn write_csv(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = Builder::new().suffix(".csv").tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// 列出原始数据备份键
pub fn load_backup_keys(db_path: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    let repo = FarmDataRepository::new(Arc::new(Mutex::new(conn)), STORAGE_KEY);
    Ok(repo.backup_keys()?)
}

/// 读取指定备份键下的原始内容
pub fn load_backup(db_path: &str, backup_key: &str) -> Result<Option<String>, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    let repo = FarmDataRepository::new(Arc::new(Mutex::new(conn)), backup_key);
    Ok(repo.load_raw()?)
}
