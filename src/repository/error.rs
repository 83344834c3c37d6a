// ==========================================
// 文献批次注册系统 - 仓储层错误类型
// ==========================================
// 职责: 登记存取失败的类型化出口
// 红线: SQL 细节不外泄,调用方只面对本枚举
// ==========================================

use thiserror::Error;

/// 登记仓储错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 存取失败 =====
    #[error("登记记录不存在: {0}")]
    NotFound(String),

    #[error("连接锁获取失败: {0}")]
    LockError(String),

    #[error("唯一约束冲突: {0}")]
    UniqueConstraintViolation(String),

    #[error("SQL 执行失败: {0}")]
    DatabaseQueryError(String),

    // ===== 流程错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                RepositoryError::NotFound("查询无返回行".to_string())
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                RepositoryError::DatabaseQueryError(msg)
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// 仓储层 Result 别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
