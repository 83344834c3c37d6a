// ==========================================
// 文献批次注册系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、能力接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch_report;
pub mod document;
pub mod history;
pub mod pid;
pub mod types;

// 重导出核心类型
pub use batch_report::{BatchReport, UniqueValueViolation, ValueOccurrences};
pub use document::{labels, Document, DocumentFields, DocumentSet};
pub use history::{HistoryTrail, MergeEvent};
pub use pid::{
    PidAssignment, PidInsert, PidRecord, PlanStats, ReconcilePlan, ReconcileRequest,
};
pub use types::{
    ConflictKind, Disposition, MergeAction, PidSource, RunMode, Severity,
};
