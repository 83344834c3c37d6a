// ==========================================
// 文献批次注册系统 - 合并历史轨迹
// ==========================================
// 职责: 记录每个文献名在合并过程中的事件序列
// 红线: 只追加,不回写; 标签字符串是对外口径,不得改动
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// MergeEvent - 合并事件
// ==========================================
// 标签字符串与注册报告口径一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeEvent {
    RegisteredArticle,    // 已注册文献入场
    Package,              // 批次来稿入场
    Accepted,             // 接受进入合并集
    Rejected,             // 拒绝
    Excluded,             // 按批次要求删除
    Solved,               // 冲突消解成功
    TitautConflict,       // 标题/作者不一致
    CheckOrderAndName,    // 进入序号/名称消解
    PkgOrderConflict,     // 批次内序号重复
    Created,              // 全新文献
    OrderAndNameConflict, // 序号与名称命中不同文献
    OrderChanged,         // 序号变更
    Unmatched,            // 候选相似度不足
    NameChanged,          // 名称变更
    Replaces(String),     // 取代某个旧名称
    ReplacedBy(String),   // 被某个新名称取代
}

impl MergeEvent {
    /// 事件的对外标签字符串
    pub fn label(&self) -> String {
        match self {
            MergeEvent::RegisteredArticle => "registered article".to_string(),
            MergeEvent::Package => "package".to_string(),
            MergeEvent::Accepted => "accepted".to_string(),
            MergeEvent::Rejected => "rejected".to_string(),
            MergeEvent::Excluded => "excluded article".to_string(),
            MergeEvent::Solved => "solved".to_string(),
            MergeEvent::TitautConflict => "detected different titles/authors".to_string(),
            MergeEvent::CheckOrderAndName => "need to check order and/or name".to_string(),
            MergeEvent::PkgOrderConflict => "detected order conflict in package".to_string(),
            MergeEvent::Created => "created".to_string(),
            MergeEvent::OrderAndNameConflict => "order and name conflicts".to_string(),
            MergeEvent::OrderChanged => "order changed".to_string(),
            MergeEvent::Unmatched => "unmatched data".to_string(),
            MergeEvent::NameChanged => "name changed".to_string(),
            MergeEvent::Replaces(other) => format!("replace {}", other),
            MergeEvent::ReplacedBy(other) => format!("replaced by {}", other),
        }
    }
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// HistoryTrail - 历史轨迹
// ==========================================
// 用途: 合并引擎写入,报告方只读
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryTrail {
    events: BTreeMap<String, Vec<MergeEvent>>,
}

impl HistoryTrail {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
        }
    }

    /// 追加一条事件
    ///
    /// # 参数
    /// - `name`: 文献名
    /// - `event`: 合并事件
    pub fn record(&mut self, name: &str, event: MergeEvent) {
        self.events.entry(name.to_string()).or_default().push(event);
    }

    /// 某个文献名的事件序列（无记录返回空切片）
    pub fn events_for(&self, name: &str) -> &[MergeEvent] {
        self.events.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// 某个文献名的标签序列（报告口径）
    pub fn labels_for(&self, name: &str) -> Vec<String> {
        self.events_for(name).iter().map(|e| e.label()).collect()
    }

    /// 是否存在该文献名的记录
    pub fn contains(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    /// 导出为 (文献名, 标签) 行,按名称有序
    ///
    /// # 返回
    /// 报告方直接可用的行列表
    pub fn as_label_rows(&self) -> Vec<(String, String)> {
        let mut rows = Vec::new();
        for (name, events) in &self.events {
            for event in events {
                rows.push((name.clone(), event.label()));
            }
        }
        rows
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
