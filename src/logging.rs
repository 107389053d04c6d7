// ==========================================
// 仓储履约装箱系统 - 日志初始化
// ==========================================
// 使用 tracing + tracing-subscriber
// 级别: RUST_LOG（默认 info，本库 debug 需显式开启）
// 格式: FULFILLMENT_PACK_LOG_FORMAT=json 时输出 JSON 行，便于批处理日志采集
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "FULFILLMENT_PACK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// 未设置或无法识别时为 Pretty
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 过滤器，例如 `RUST_LOG=fulfillment_pack=debug`
/// - FULFILLMENT_PACK_LOG_FORMAT: `json` 或留空
///
/// # 示例
/// ```no_run
/// use fulfillment_pack::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::from_env_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    // 重复初始化（例如嵌入到其他进程）时忽略
    let result = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("日志系统已初始化，跳过");
    }
}

/// 测试用日志（debug 级别，输出到测试捕获）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
