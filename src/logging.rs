// ==========================================
// 文献批次注册系统 - 日志初始化
// ==========================================
// 说明:
// - 库本身不抢注全局订阅器,由调用方在进程入口选一种形态
// - 三种形态: 人读 / JSON 行 / 测试采集
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// RUST_LOG 未设置时的默认过滤器
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 初始化人读格式日志
///
/// # 环境变量
/// - `RUST_LOG`: 过滤器,如 `debug` 或 `doc_registry=trace`
///
/// # 示例
/// ```no_run
/// use doc_registry::logging;
/// logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化 JSON 行格式日志（注册流水线收集用）
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter())
        .with_target(true)
        .init();
}

/// 测试环境日志: 输出走测试采集器,重复调用安全
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
