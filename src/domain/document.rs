// ==========================================
// 文献批次注册系统 - 文献领域模型
// ==========================================
// 职责: 批次内单篇文献的核心字段与能力接口
// 红线: 引擎层只通过 DocumentFields 访问字段,不绑定具体结构
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 字段标签 (Field Labels)
// ==========================================
// 批次一致性检查使用的标签键,与导出报告口径一致
pub mod labels {
    pub const ORDER: &str = "order";
    pub const DOI: &str = "doi";
    pub const ELOCATION_ID: &str = "elocation id";
    pub const FPAGE_LPAGE_SEQ_ELOCATION_ID: &str = "fpage-lpage-seq-elocation-id";
    pub const JOURNAL_TITLE: &str = "journal-title";
    pub const JOURNAL_ID_NLM_TA: &str = "journal-id (nlm-ta)";
    pub const E_ISSN: &str = "e-ISSN";
    pub const PRINT_ISSN: &str = "print ISSN";
    pub const JOURNAL_ISSN: &str = "journal ISSN";
    pub const PUBLISHER_NAME: &str = "publisher name";
    pub const ISSUE_LABEL: &str = "issue label";
    pub const ISSUE_PUB_DATE: &str = "issue pub date";
    pub const LICENSE: &str = "license";
}

// ==========================================
// DocumentFields - 文献能力接口
// ==========================================
// 用途: 合并引擎/检查器的唯一字段访问途径
// 任何实现了该接口的文献表示都可以参与合并
pub trait DocumentFields {
    /// 批次内唯一名称（文件名去扩展名口径）
    fn name(&self) -> &str;

    /// 期次内序号（位置标识）
    fn order(&self) -> &str;

    /// 标题（相似度比较输入）
    fn title(&self) -> &str;

    /// 作者列表（相似度比较输入）
    fn authors(&self) -> &[String];

    /// 批次是否要求删除该文献
    fn marked_for_deletion(&self) -> bool;

    /// 来稿是否为 ahead-of-print
    fn is_ahead(&self) -> bool;

    /// 已注册文献是否曾为 ahead-of-print 且已归入正式期次
    fn is_ex_aop(&self) -> bool;

    /// 短标识（调和请求主键）
    fn short_id(&self) -> Option<&str>;

    /// 文档自带的持久标识（存在时走覆盖登记分支）
    fn persistent_id(&self) -> Option<&str>;

    /// 勘误前的旧短标识
    fn previous_short_id(&self) -> Option<&str>;

    /// 按标签取值（批次一致性检查用）
    ///
    /// # 参数
    /// - `label`: 字段标签（见 `labels` 模块）
    ///
    /// # 返回
    /// 值存在返回 Some,字段缺失返回 None
    fn field_value(&self, label: &str) -> Option<String> {
        if label == labels::ORDER {
            return Some(self.order().to_string());
        }
        None
    }
}

// ==========================================
// Document - 文献
// ==========================================
// 用途: 编排方构造,引擎层只读
// 说明: metadata 承载一致性检查标签值,值可显式缺失(None)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    // ===== 身份 =====
    pub name: String,  // 批次内唯一名称
    pub order: String, // 期次内序号

    // ===== 相似度输入 =====
    pub title: String,        // 标题
    pub authors: Vec<String>, // 作者列表（姓氏口径）

    // ===== 合并标志 =====
    pub marked_for_deletion: bool, // 批次要求删除
    pub is_ahead: bool,            // 来稿 ahead-of-print
    pub is_ex_aop: bool,           // 已注册且曾为 ahead-of-print

    // ===== 标识三元组 =====
    pub short_id: Option<String>,          // 短标识
    pub persistent_id: Option<String>,     // 持久标识（自带时覆盖登记）
    pub previous_short_id: Option<String>, // 勘误前的旧短标识

    // ===== 一致性检查标签 =====
    #[serde(default)]
    pub metadata: BTreeMap<String, Option<String>>, // 标签 → 值（None 表示显式缺失）
}

impl DocumentFields for Document {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> &str {
        &self.order
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn authors(&self) -> &[String] {
        &self.authors
    }

    fn marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    fn is_ahead(&self) -> bool {
        self.is_ahead
    }

    fn is_ex_aop(&self) -> bool {
        self.is_ex_aop
    }

    fn short_id(&self) -> Option<&str> {
        self.short_id.as_deref()
    }

    fn persistent_id(&self) -> Option<&str> {
        self.persistent_id.as_deref()
    }

    fn previous_short_id(&self) -> Option<&str> {
        self.previous_short_id.as_deref()
    }

    fn field_value(&self, label: &str) -> Option<String> {
        if label == labels::ORDER {
            return Some(self.order.clone());
        }
        self.metadata.get(label).cloned().flatten()
    }
}

// ==========================================
// 文献集合别名
// ==========================================
// BTreeMap 保证按名称有序迭代,合并结果可复现
pub type DocumentSet<D> = BTreeMap<String, D>;
