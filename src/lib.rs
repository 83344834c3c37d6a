// ==========================================
// 文献批次注册系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 批次注册核心 (检查 → 合并 → 标识调和)
// 冲突永不自动猜测,以数据形式交给人工裁决
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 文献实体/历史轨迹/报告与标识类型
pub mod domain;

// 仓储层 - 持久标识登记存取
pub mod repository;

// 引擎层 - 批次检查/身份合并/标识调和
pub mod engine;

// 配置层 - 阈值与运行模式
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志初始化
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ConflictKind, Disposition, MergeAction, PidSource, RunMode, Severity};

// 领域实体
pub use domain::{
    BatchReport, Document, DocumentFields, DocumentSet, HistoryTrail, MergeEvent, PidAssignment,
    PidRecord, ReconcilePlan, ReconcileRequest,
};

// 引擎
pub use engine::{
    BatchChecker, MergeEngine, MergeOutcome, PidGenerator, PidReconciler, ReconcileCore,
    SimilarityJudge, TitleAuthorJudge, UuidPidGenerator,
};

// 仓储
pub use repository::{PidRegistryRepository, RepositoryError, RepositoryResult, SqlitePidRegistry};

// 配置
pub use config::RegistryConfig;

// ==========================================
// 常量定义
// ==========================================

// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "文献批次注册系统";

// ==========================================
// 预编译检查
// ==========================================
