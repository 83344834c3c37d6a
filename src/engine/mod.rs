// ==========================================
// 文献批次注册系统 - 引擎层
// ==========================================
// 职责: 批次检查、身份合并、标识调和的业务规则
// 红线: Engine 不拼 SQL, 所有判定必须输出 reason / 历史事件
// ==========================================

pub mod batch_check;
pub mod merge;
pub mod pid_reconciler;
pub mod reconcile_core;
pub mod similarity;

// 重导出核心引擎
pub use batch_check::BatchChecker;
pub use merge::{MergeEngine, MergeOutcome};
pub use pid_reconciler::{PidGenerator, PidReconciler, UuidPidGenerator};
pub use reconcile_core::{PidChoice, ReconcileCore, ReconcileDecision};
pub use similarity::{SimilarityJudge, TitleAuthorJudge, DEFAULT_SIMILARITY_THRESHOLD};
