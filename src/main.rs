// ==========================================
// 禽场生产跟踪系统 - 命令行入口
// ==========================================
// 数据库路径: --db / POULTRY_FARM_DB_PATH / 用户数据目录
// ==========================================

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use poultry_farm_tracker::app::{get_default_db_path, AppState};
use poultry_farm_tracker::domain::{FarmCycleEntry, NewCycle};
use poultry_farm_tracker::logging::{self, LogFormat};
use poultry_farm_tracker::OperationResult;
use std::path::PathBuf;
use std::time::Duration;

/// 退出前等待远程活动日志发送的时限
const ACTIVITY_LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "poultry-farm-tracker", version, about = "禽场生产跟踪系统")]
struct Cli {
    /// 数据库文件路径
    #[arg(long, env = "POULTRY_FARM_DB_PATH")]
    db: Option<String>,

    /// 以 JSON 行格式输出日志
    #[arg(long)]
    json_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 显示批次与数据概况
    Status,

    /// 导出完整备份 JSON
    Export { file: PathBuf },

    /// 从备份 JSON 导入（整体替换当前数据）
    Import { file: PathBuf },

    /// 导入员工名册 CSV
    ImportEmployees { csv: PathBuf },

    /// 导入雏鸡接收 CSV（写入各场区进行中的批次）
    ImportChicks { csv: PathBuf },

    /// 新建批次
    StartCycle {
        /// 批次号
        #[arg(long)]
        cycle_no: String,

        /// 场区条目，格式 "场区,cropNo,YYYY-MM-DD"，可重复
        #[arg(long = "farm", required = true, value_parser = parse_farm_entry)]
        farms: Vec<FarmCycleEntry>,
    },

    /// 结束场区批次
    FinishCycle {
        #[arg(long)]
        cycle_id: String,
        #[arg(long)]
        farm: String,
        /// 结束日期 YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// 重新打开场区批次
    ReopenCycle {
        #[arg(long)]
        cycle_id: String,
        #[arg(long)]
        farm: String,
    },
}

fn parse_farm_entry(raw: &str) -> Result<FarmCycleEntry, String> {
    let parts: Vec<&str> = raw.split(',').map(|s| s.trim()).collect();
    match parts.as_slice() {
        [farm, crop_no, start_date] if !farm.is_empty() => {
            chrono::NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
                .map_err(|e| format!("开始日期格式错误 {}: {}", start_date, e))?;
            Ok(FarmCycleEntry::new(farm, crop_no, start_date))
        }
        _ => Err(format!("场区条目格式应为 \"场区,cropNo,YYYY-MM-DD\": {}", raw)),
    }
}

fn report(result: OperationResult) -> anyhow::Result<()> {
    if result.success {
        println!("{}", result.message);
        Ok(())
    } else {
        bail!(result.message)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(if cli.json_log {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let app = AppState::open(&db_path)
        .await
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let result = run(&app, cli.command);
    app.flush_activity_log(ACTIVITY_LOG_FLUSH_TIMEOUT).await;
    result
}

fn run(app: &AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Status => {
            let data = app.snapshot().map_err(anyhow::Error::msg)?;
            match data.cycles.active_cycle() {
                Some(cycle) => println!("当前活动批次: {} (id={})", cycle.cycle_no, cycle.id),
                None => println!("当前无活动批次"),
            }
            for cycle in data.cycles.cycles() {
                println!("批次 {} (id={})", cycle.cycle_no, cycle.id);
                for entry in &cycle.farms {
                    println!(
                        "  {:<16} crop={:<6} start={} 状态={}",
                        entry.farm_name,
                        entry.crop_no,
                        entry.start_date,
                        entry.state()
                    );
                }
            }
            println!(
                "雏鸡接收记录 {} 条（未关联批次 {} 条），员工 {} 人，未读通知 {} 条",
                data.chicks_receiving.len(),
                data.chicks_receiving.orphan_count(),
                data.employees.len(),
                data.unread_notifications()
            );
            if data.is_maintenance_mode {
                println!("维护模式: 开启");
            }
        }
        Command::Export { file } => {
            app.backup_api.export_to_file(&file)?;
            println!("已导出到 {}", file.display());
        }
        Command::Import { file } => report(app.backup_api.import_from_file(&file))?,
        Command::ImportEmployees { csv } => {
            let response = app.import_api.import_employees_file(&csv);
            for w in &response.summary.warnings {
                println!("  {}", w);
            }
            report(OperationResult {
                success: response.success,
                message: response.message,
            })?
        }
        Command::ImportChicks { csv } => {
            let response = app.import_api.import_chicks_receiving_file(&csv);
            for w in &response.summary.warnings {
                println!("  {}", w);
            }
            for w in &response.quality_warnings {
                println!("  告警: {}", w.message());
            }
            report(OperationResult {
                success: response.success,
                message: response.message,
            })?
        }
        Command::StartCycle { cycle_no, farms } => {
            let cycle = app.cycle_api.start_new_cycle(NewCycle { cycle_no, farms })?;
            println!("已创建批次 {} (id={})", cycle.cycle_no, cycle.id);
        }
        Command::FinishCycle { cycle_id, farm, date } => report(OperationResult::from_result(
            app.cycle_api.finish_farm_cycle(&cycle_id, &farm, &date),
            |_| format!("{} 已结束于 {}", farm, date),
        ))?,
        Command::ReopenCycle { cycle_id, farm } => report(OperationResult::from_result(
            app.cycle_api.reopen_farm_cycle(&cycle_id, &farm),
            |_| format!("{} 已重新打开", farm),
        ))?,
    }

    Ok(())
}
