// ==========================================
// 文献批次注册系统 - 持久标识领域模型
// ==========================================
// 职责: 登记表记录 / 调和请求 / 写入计划 / 调和结果
// 红线: 计划由引擎产出,仓储只负责在单事务内执行
// ==========================================

use crate::domain::document::DocumentFields;
use crate::domain::types::PidSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PidRecord - 登记表记录
// ==========================================
// 对齐: pid_registry 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidRecord {
    pub id: i64,                    // 行号（插入顺序,冲突裁决以最早行为准）
    pub alias: String,              // 别名（短标识或旧短标识）
    pub persistent_id: String,      // 持久标识
    pub created_at: DateTime<Utc>,  // 登记时间
}

// ==========================================
// ReconcileRequest - 调和请求
// ==========================================
// 一篇文献的标识三元组
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub short_id: String,                  // 短标识（必填）
    pub persistent_id: Option<String>,     // 文档自带持久标识（存在时覆盖登记）
    pub previous_short_id: Option<String>, // 勘误前的旧短标识
}

impl ReconcileRequest {
    pub fn new(
        short_id: impl Into<String>,
        persistent_id: Option<String>,
        previous_short_id: Option<String>,
    ) -> Self {
        Self {
            short_id: short_id.into(),
            persistent_id,
            previous_short_id,
        }
    }

    /// 从文献构造调和请求（缺少短标识返回 None）
    pub fn for_document<D: DocumentFields>(doc: &D) -> Option<Self> {
        let short_id = doc.short_id()?;
        Some(Self {
            short_id: short_id.to_string(),
            persistent_id: doc.persistent_id().map(|s| s.to_string()),
            previous_short_id: doc.previous_short_id().map(|s| s.to_string()),
        })
    }

    /// 非空别名列表（短标识在前,旧短标识在后,去重）
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases = vec![self.short_id.as_str()];
        if let Some(prev) = self.previous_short_id.as_deref() {
            if !prev.is_empty() && prev != self.short_id {
                aliases.push(prev);
            }
        }
        aliases
    }
}

// ==========================================
// PidInsert - 待写入的别名映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidInsert {
    pub alias: String,         // 别名
    pub persistent_id: String, // 持久标识
}

// ==========================================
// ReconcilePlan - 写入计划
// ==========================================
// 引擎判定产物,仓储在单事务内按 删除 → 插入 顺序执行
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcilePlan {
    pub delete_by_persistent_id: Option<String>, // 删除引用该持久标识的全部行
    pub delete_by_alias: Vec<String>,            // 删除这些别名的全部行（覆盖登记用）
    pub delete_row_ids: Vec<i64>,                // 删除指定行（失败方/冗余行）
    pub inserts: Vec<PidInsert>,                 // 插入别名映射（重复键视为已满足）
}

impl ReconcilePlan {
    /// 计划是否无任何写入
    pub fn is_noop(&self) -> bool {
        self.delete_by_persistent_id.is_none()
            && self.delete_by_alias.is_empty()
            && self.delete_row_ids.is_empty()
            && self.inserts.is_empty()
    }
}

// ==========================================
// PlanStats - 计划执行统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub deleted: usize,  // 实际删除行数
    pub inserted: usize, // 实际插入行数（OR IGNORE 命中的重复键不计）
}

impl PlanStats {
    /// 本次执行是否零写入
    pub fn is_noop(&self) -> bool {
        self.deleted == 0 && self.inserted == 0
    }
}

// ==========================================
// PidAssignment - 调和结果
// ==========================================
// 返回给编排方的最终标识三元组
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidAssignment {
    pub short_id: String,                  // 短标识
    pub persistent_id: String,             // 调和后的持久标识
    pub previous_short_id: Option<String>, // 旧短标识
    pub source: PidSource,                 // 标识来历
    pub reasons: Vec<String>,              // 判定理由（可解释性）
}
