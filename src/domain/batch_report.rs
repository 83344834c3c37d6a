// ==========================================
// 文献批次注册系统 - 批次一致性报告类型
// ==========================================
// 职责: 批次检查器输出的结构化结论
// 说明: 只描述事实,不渲染报告(渲染由编排方负责)
// ==========================================

use crate::domain::types::{RunMode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ValueOccurrences - 单个标签的取值分布
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueOccurrences {
    pub groups: BTreeMap<String, Vec<String>>, // 值 → 持有该值的文献名
    pub missing: Vec<String>,                  // 值缺失的文献名
}

impl ValueOccurrences {
    /// 不同取值的数量（缺失组算一种取值）
    pub fn distinct_count(&self) -> usize {
        self.groups.len() + usize::from(!self.missing.is_empty())
    }

    /// 是否存在取值分歧
    pub fn is_conflicting(&self) -> bool {
        self.distinct_count() > 1
    }
}

// ==========================================
// UniqueValueViolation - 唯一值冲突
// ==========================================
// 期望唯一的标签上出现了重复取值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueValueViolation {
    pub label: String,      // 标签
    pub severity: Severity, // 严重级别（与运行模式相关）
    pub value: String,      // 重复的取值
    pub names: Vec<String>, // 持有该值的文献名
}

// ==========================================
// BatchReport - 批次一致性报告
// ==========================================
// 用途: 检查器输出,供报告方与合并引擎消费
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub mode: RunMode, // 本次检查的运行模式

    // ===== 应当一致的标签 =====
    pub common_values: BTreeMap<String, ValueOccurrences>, // 标签 → 取值分布
    pub conflicting_labels: Vec<String>,                   // 取值有分歧的标签

    // ===== 必填标签 =====
    pub missing_required: BTreeMap<String, Vec<String>>, // 标签 → 缺失该值的文献名

    // ===== 应当唯一的标签 =====
    pub unique_value_violations: Vec<UniqueValueViolation>,

    // ===== 批次内序号冲突（供合并引擎消费）=====
    pub order_collisions: BTreeMap<String, Vec<String>>, // 序号 → 文献名（剔除删除标记）
}

impl BatchReport {
    /// 报告中最高的严重级别（无冲突返回 None）
    pub fn max_severity(&self) -> Option<Severity> {
        self.unique_value_violations
            .iter()
            .map(|v| v.severity)
            .max()
    }

    /// 是否存在阻断注册的结论
    pub fn has_blocking(&self) -> bool {
        self.unique_value_violations
            .iter()
            .any(|v| v.severity == Severity::BlockingError)
    }
}
