// ==========================================
// 文献批次注册系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 所有打开登记库的入口共用同一套 PRAGMA
// - busy_timeout 统一配置,降低并发写偶发 busy 的概率
// ==========================================

use rusqlite::Connection;
use std::time::Duration;
use tracing::debug;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 登记表由仓储在构造时幂等创建（CREATE TABLE IF NOT EXISTS）
/// - 版本号只用于提示/告警,不做自动迁移
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 按默认 busy_timeout 配置连接 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    configure_sqlite_connection_with_timeout(conn, DEFAULT_BUSY_TIMEOUT_MS)
}

/// 配置连接 PRAGMA 并指定 busy_timeout（毫秒）
///
/// 说明：foreign_keys 与 busy_timeout 都是连接级状态,每个连接单独设置
pub fn configure_sqlite_connection_with_timeout(
    conn: &Connection,
    busy_timeout_ms: u64,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

/// 打开登记数据库连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    debug!(db_path, "登记数据库连接已打开");
    Ok(conn)
}

/// 读取 schema_version 的最大值,表不存在视为未打版本戳
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let lookup = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    });
    match lookup {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::SqliteFailure(_, Some(ref msg))) if msg.contains("no such table") => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
