// ==========================================
// 禽场生产跟踪系统 - 日志初始化
// ==========================================
// 工具: tracing-subscriber（EnvFilter + fmt）
// 级别: RUST_LOG 优先；未设置时本库 info，依赖库 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤规则
pub const DEFAULT_DIRECTIVES: &str = "poultry_farm_tracker=info,warn";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 终端可读格式
    #[default]
    Pretty,
    /// JSON 行（便于日志采集）
    Json,
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// 初始化全局日志
///
/// 重复初始化时静默忽略
///
/// # 示例
/// ```no_run
/// use poultry_farm_tracker::logging::{self, LogFormat};
/// logging::init(LogFormat::Pretty);
/// ```
pub fn init(format: LogFormat) {
    let result = match format {
        LogFormat::Pretty => fmt()
            .with_env_filter(build_filter())
            .with_target(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(build_filter())
            .with_current_span(false)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("日志系统已初始化，跳过");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        assert!(DEFAULT_DIRECTIVES.parse::<EnvFilter>().is_ok());
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(LogFormat::Pretty);
        init(LogFormat::Json);
    }
}
