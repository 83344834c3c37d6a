// ==========================================
// 文献批次注册系统 - 领域类型定义
// ==========================================
// 职责: 合并动作 / 终态 / 冲突类别 / 严重级别 等闭集枚举
// 红线: 动作是闭集,不允许开放字符串标签
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 合并动作 (Merge Action)
// ==========================================
// 分类阶段对每篇来稿判定的初始动作
// 序列化格式: SCREAMING_SNAKE_CASE (与历史轨迹导出一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeAction {
    Update,                   // 键匹配且相似,接受更新
    Delete,                   // 批次要求删除已注册文献
    Reject,                   // ahead-of-print 回退,直接拒绝
    NeedsTitautResolution,    // 标题/作者不相似,进入标题作者消解
    NeedsOrderNameResolution, // 无键匹配,进入序号/名称消解
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeAction::Update => write!(f, "UPDATE"),
            MergeAction::Delete => write!(f, "DELETE"),
            MergeAction::Reject => write!(f, "REJECT"),
            MergeAction::NeedsTitautResolution => write!(f, "NEEDS_TITAUT_RESOLUTION"),
            MergeAction::NeedsOrderNameResolution => write!(f, "NEEDS_ORDER_NAME_RESOLUTION"),
        }
    }
}

// ==========================================
// 冲突类别 (Conflict Kind)
// ==========================================
// 序号/名称消解阶段未解决冲突的细分类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    PkgOrderConflict,     // 批次内序号重复
    OrderAndNameConflict, // 序号与名称命中不同的已注册文献
    Unmatched,            // 命中候选但相似度不足
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::PkgOrderConflict => write!(f, "PKG_ORDER_CONFLICT"),
            ConflictKind::OrderAndNameConflict => write!(f, "ORDER_AND_NAME_CONFLICT"),
            ConflictKind::Unmatched => write!(f, "UNMATCHED"),
        }
    }
}

// ==========================================
// 终态 (Disposition)
// ==========================================
// 每篇来稿在合并结束时恰好落在一个终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Accepted,                        // 进入合并集
    Rejected,                        // 被拒绝
    Deleted,                         // 按批次要求删除
    UnresolvedTitaut,                // 标题/作者冲突未解决
    UnresolvedOrderName(ConflictKind), // 序号/名称冲突未解决
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Accepted => write!(f, "ACCEPTED"),
            Disposition::Rejected => write!(f, "REJECTED"),
            Disposition::Deleted => write!(f, "DELETED"),
            Disposition::UnresolvedTitaut => write!(f, "UNRESOLVED_TITAUT"),
            Disposition::UnresolvedOrderName(kind) => {
                write!(f, "UNRESOLVED_ORDER_NAME({})", kind)
            }
        }
    }
}

// ==========================================
// 严重级别 (Severity)
// ==========================================
// 批次一致性检查结论的严重级别
// 顺序: Warning < Error < FatalError < BlockingError
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,       // 提示,不阻断
    Error,         // 错误
    FatalError,    // 致命错误
    BlockingError, // 阻断注册
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::FatalError => write!(f, "FATAL ERROR"),
            Severity::BlockingError => write!(f, "BLOCKING ERROR"),
        }
    }
}

// ==========================================
// 运行模式 (Run Mode)
// ==========================================
// Registration: 正式注册,序号重复阻断
// Preview: 预检,序号重复仅告警
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    Registration, // 正式注册
    Preview,      // 预检
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Registration => write!(f, "REGISTRATION"),
            RunMode::Preview => write!(f, "PREVIEW"),
        }
    }
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Preview
    }
}

impl RunMode {
    /// 从字符串解析运行模式
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "REGISTRATION" => RunMode::Registration,
            "PREVIEW" => RunMode::Preview,
            _ => RunMode::Preview, // 默认值
        }
    }
}

// ==========================================
// 持久标识来源 (Pid Source)
// ==========================================
// 调和结果中持久标识的来历
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PidSource {
    Explicit,  // 文档自带,覆盖登记
    Adopted,   // 采纳登记表中已有标识
    Generated, // 新生成
}

impl fmt::Display for PidSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidSource::Explicit => write!(f, "EXPLICIT"),
            PidSource::Adopted => write!(f, "ADOPTED"),
            PidSource::Generated => write!(f, "GENERATED"),
        }
    }
}
