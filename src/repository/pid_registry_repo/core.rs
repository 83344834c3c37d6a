use crate::domain::pid::{PidRecord, PlanStats, ReconcilePlan};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// PidRegistryRepository - 登记仓储契约
// ==========================================
// 引擎经由该契约访问登记表,便于以内存实现做判定测试
pub trait PidRegistryRepository: Send + Sync {
    /// 查询这些别名名下的全部登记行（按行号升序）
    fn find_by_aliases(&self, aliases: &[&str]) -> RepositoryResult<Vec<PidRecord>>;

    /// 在单事务内执行写入计划: 先删除后插入
    ///
    /// # 说明
    /// - 插入使用 INSERT OR IGNORE,并发下的重复键写入视为已满足
    /// - 任一语句失败即整体回滚
    fn apply_plan(&self, plan: &ReconcilePlan) -> RepositoryResult<PlanStats>;

    /// 某别名当前解析到的持久标识（最早行优先）
    fn find_persistent_id(&self, alias: &str) -> RepositoryResult<Option<String>>;

    /// 指定别名映射是否已登记
    fn is_registered(&self, alias: &str, persistent_id: &str) -> RepositoryResult<bool>;

    /// 某别名名下的登记行数
    fn count_rows_for_alias(&self, alias: &str) -> RepositoryResult<i64>;
}

// ==========================================
// SqlitePidRegistry - SQLite 登记仓储
// ==========================================
pub struct SqlitePidRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePidRegistry {
    /// 创建登记仓储,建表建索引
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        // 建表失败不阻断构造,后续使用时错误会再次浮现
        if let Err(e) = repo.ensure_table_and_indexes() {
            tracing::warn!("pid_registry ensure failed: {}", e);
        }
        repo
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table_and_indexes(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pid_registry (
              id            INTEGER PRIMARY KEY AUTOINCREMENT,
              alias         TEXT NOT NULL,
              persistent_id TEXT NOT NULL,
              created_at    TEXT NOT NULL DEFAULT (datetime('now')),
              UNIQUE(alias, persistent_id)
            );

            CREATE INDEX IF NOT EXISTS idx_pid_registry_alias ON pid_registry(alias);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PidRecord> {
        Ok(PidRecord {
            id: row.get(0)?,
            alias: row.get(1)?,
            persistent_id: row.get(2)?,
            created_at: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(3)?,
                "%Y-%m-%d %H:%M:%S",
            )
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .and_utc(),
        })
    }
}

impl PidRegistryRepository for SqlitePidRegistry {
    fn find_by_aliases(&self, aliases: &[&str]) -> RepositoryResult<Vec<PidRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, alias, persistent_id, created_at
            FROM pid_registry
            WHERE alias = ?1
            ORDER BY id
            "#,
        )?;

        let mut records = Vec::new();
        for alias in aliases {
            let rows = stmt.query_map(params![alias], Self::map_row)?;
            for row in rows {
                records.push(row?);
            }
        }
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    fn apply_plan(&self, plan: &ReconcilePlan) -> RepositoryResult<PlanStats> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut deleted = 0usize;
        if let Some(pid) = &plan.delete_by_persistent_id {
            deleted += tx.execute(
                "DELETE FROM pid_registry WHERE persistent_id = ?1",
                params![pid],
            )?;
        }
        for alias in &plan.delete_by_alias {
            deleted += tx.execute("DELETE FROM pid_registry WHERE alias = ?1", params![alias])?;
        }
        for row_id in &plan.delete_row_ids {
            deleted += tx.execute("DELETE FROM pid_registry WHERE id = ?1", params![row_id])?;
        }

        let mut inserted = 0usize;
        for insert in &plan.inserts {
            inserted += tx.execute(
                "INSERT OR IGNORE INTO pid_registry (alias, persistent_id) VALUES (?1, ?2)",
                params![insert.alias, insert.persistent_id],
            )?;
        }

        tx.commit()?;
        Ok(PlanStats { deleted, inserted })
    }

    fn find_persistent_id(&self, alias: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let pid = conn
            .query_row(
                "SELECT persistent_id FROM pid_registry WHERE alias = ?1 ORDER BY id LIMIT 1",
                params![alias],
                |row| row.get(0),
            )
            .optional()?;
        Ok(pid)
    }

    fn is_registered(&self, alias: &str, persistent_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pid_registry WHERE alias = ?1 AND persistent_id = ?2",
            params![alias, persistent_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn count_rows_for_alias(&self, alias: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pid_registry WHERE alias = ?1",
            params![alias],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
