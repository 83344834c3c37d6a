// ==========================================
// 文献批次注册系统 - 批次一致性检查器
// ==========================================
// 职责: 对一个批次做纯只读分析,产出结构化结论
// 输入: 批次文献集合 + 运行模式
// 输出: BatchReport（取值分布 / 缺失 / 唯一值冲突 / 序号冲突）
// 红线: 不修改输入,不做 I/O,结论必须可复现
// ==========================================

use crate::domain::batch_report::{BatchReport, UniqueValueViolation, ValueOccurrences};
use crate::domain::document::{labels, DocumentFields, DocumentSet};
use crate::domain::types::{RunMode, Severity};
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// 默认标签集
// ==========================================

/// 批次内应当取值一致的标签
pub const EXPECTED_COMMON_LABELS: [&str; 7] = [
    labels::JOURNAL_TITLE,
    labels::JOURNAL_ID_NLM_TA,
    labels::E_ISSN,
    labels::PRINT_ISSN,
    labels::ISSUE_LABEL,
    labels::ISSUE_PUB_DATE,
    labels::LICENSE,
];

/// 分组时跳过缺失值的标签（这些标签部分缺失属正常情况）
pub const SKIP_MISSING_LABELS: [&str; 3] = [
    labels::JOURNAL_ID_NLM_TA,
    labels::E_ISSN,
    labels::PRINT_ISSN,
];

/// 默认必填标签
pub const DEFAULT_REQUIRED_LABELS: [&str; 5] = [
    labels::JOURNAL_TITLE,
    labels::JOURNAL_ISSN,
    labels::PUBLISHER_NAME,
    labels::ISSUE_LABEL,
    labels::ISSUE_PUB_DATE,
];

/// 批次内应当取值唯一的标签
pub const EXPECTED_UNIQUE_LABELS: [&str; 4] = [
    labels::ORDER,
    labels::DOI,
    labels::ELOCATION_ID,
    labels::FPAGE_LPAGE_SEQ_ELOCATION_ID,
];

// ==========================================
// BatchChecker - 批次一致性检查器
// ==========================================
pub struct BatchChecker<'a, D: DocumentFields> {
    documents: &'a DocumentSet<D>,
    mode: RunMode,
    common_labels: Vec<String>,
    required_labels: Vec<String>,
    unique_labels: Vec<String>,
}

impl<'a, D: DocumentFields> BatchChecker<'a, D> {
    /// 用默认标签集构造检查器
    ///
    /// # 参数
    /// - `documents`: 批次文献集合（借用,不修改）
    /// - `mode`: 运行模式（影响序号重复的严重级别）
    pub fn new(documents: &'a DocumentSet<D>, mode: RunMode) -> Self {
        Self {
            documents,
            mode,
            common_labels: EXPECTED_COMMON_LABELS.iter().map(|s| s.to_string()).collect(),
            required_labels: DEFAULT_REQUIRED_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            unique_labels: EXPECTED_UNIQUE_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 覆盖必填标签（每刊差异由编排方提供,检查器只做查表）
    pub fn with_required_labels(mut self, required: Vec<String>) -> Self {
        self.required_labels = required;
        self
    }

    /// 覆盖应当一致的标签
    pub fn with_common_labels(mut self, common: Vec<String>) -> Self {
        self.common_labels = common;
        self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 应当一致的标签的取值分布
    ///
    /// # 规则
    /// - 每个标签按取值把文献名分组
    /// - 缺失值作为一个分组参与,SKIP_MISSING_LABELS 中的标签除外
    pub fn common_values(&self) -> BTreeMap<String, ValueOccurrences> {
        let mut result = BTreeMap::new();
        for label in &self.common_labels {
            let skip_missing = SKIP_MISSING_LABELS.contains(&label.as_str());
            result.insert(label.clone(), self.group_by_value(label, skip_missing));
        }
        result
    }

    /// 取值有分歧的标签子集
    pub fn conflicting_values(&self) -> BTreeMap<String, ValueOccurrences> {
        self.common_values()
            .into_iter()
            .filter(|(_, occurrences)| occurrences.is_conflicting())
            .collect()
    }

    /// 必填标签的缺失情况
    ///
    /// # 返回
    /// 标签 → 值缺失（或为空串）的文献名列表,全部齐备的标签不出现
    pub fn missing_required(&self) -> BTreeMap<String, Vec<String>> {
        let mut result = BTreeMap::new();
        for label in &self.required_labels {
            let mut missing = Vec::new();
            for (name, doc) in self.documents {
                let absent = match doc.field_value(label) {
                    None => true,
                    Some(value) => value.trim().is_empty(),
                };
                if absent {
                    missing.push(name.clone());
                }
            }
            if !missing.is_empty() {
                result.insert(label.clone(), missing);
            }
        }
        result
    }

    /// 应当唯一的标签上的重复取值
    ///
    /// # 规则
    /// - 缺失值不参与分组
    /// - 同一取值出现在多篇文献上即判为冲突,严重级别按标签与运行模式给出
    pub fn unique_value_violations(&self) -> Vec<UniqueValueViolation> {
        let mut violations = Vec::new();
        for label in &self.unique_labels {
            let occurrences = self.group_by_value(label, true);
            for (value, names) in occurrences.groups {
                if names.len() > 1 {
                    violations.push(UniqueValueViolation {
                        label: label.clone(),
                        severity: Self::severity_for(label, self.mode),
                        value,
                        names,
                    });
                }
            }
        }
        violations
    }

    /// 批次内序号冲突（供合并引擎消费）
    ///
    /// # 规则
    /// - 带删除标记的文献不参与
    /// - 仅保留被多篇文献共用的序号
    pub fn order_collisions(&self) -> BTreeMap<String, Vec<String>> {
        let mut by_order: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, doc) in self.documents {
            if doc.marked_for_deletion() {
                continue;
            }
            by_order
                .entry(doc.order().to_string())
                .or_default()
                .push(name.clone());
        }
        by_order.retain(|_, names| names.len() > 1);
        by_order
    }

    /// 按 (序号, 名称) 排序的文献名列表
    pub fn names_sorted_by_order(&self) -> Vec<String> {
        let mut keyed: Vec<(String, String)> = self
            .documents
            .iter()
            .map(|(name, doc)| (doc.order().to_string(), name.clone()))
            .collect();
        keyed.sort();
        keyed.into_iter().map(|(_, name)| name).collect()
    }

    /// 批次内是否存在 ahead-of-print 文献
    pub fn has_ahead_documents(&self) -> bool {
        self.documents.values().any(|doc| doc.is_ahead())
    }

    /// 生成完整批次报告
    pub fn report(&self) -> BatchReport {
        let common_values = self.common_values();
        let conflicting_labels: Vec<String> = common_values
            .iter()
            .filter(|(_, occ)| occ.is_conflicting())
            .map(|(label, _)| label.clone())
            .collect();
        let report = BatchReport {
            mode: self.mode,
            common_values,
            conflicting_labels,
            missing_required: self.missing_required(),
            unique_value_violations: self.unique_value_violations(),
            order_collisions: self.order_collisions(),
        };
        debug!(
            documents = self.documents.len(),
            conflicting_labels = report.conflicting_labels.len(),
            unique_violations = report.unique_value_violations.len(),
            order_collisions = report.order_collisions.len(),
            "生成批次一致性报告"
        );
        report
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 按标签取值分组
    fn group_by_value(&self, label: &str, skip_missing: bool) -> ValueOccurrences {
        let mut occurrences = ValueOccurrences::default();
        for (name, doc) in self.documents {
            match doc.field_value(label) {
                Some(value) if !value.trim().is_empty() => {
                    occurrences.groups.entry(value).or_default().push(name.clone());
                }
                _ => {
                    if !skip_missing {
                        occurrences.missing.push(name.clone());
                    }
                }
            }
        }
        occurrences
    }

    /// 唯一值标签的严重级别
    ///
    /// # 规则
    /// - order: 正式注册阻断,预检仅告警
    /// - doi: 致命错误
    /// - elocation id: 阻断
    /// - fpage-lpage-seq-elocation-id: 错误
    /// - 其余标签: 错误
    fn severity_for(label: &str, mode: RunMode) -> Severity {
        match label {
            l if l == labels::ORDER => match mode {
                RunMode::Registration => Severity::BlockingError,
                RunMode::Preview => Severity::Warning,
            },
            l if l == labels::DOI => Severity::FatalError,
            l if l == labels::ELOCATION_ID => Severity::BlockingError,
            l if l == labels::FPAGE_LPAGE_SEQ_ELOCATION_ID => Severity::Error,
            _ => Severity::Error,
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::Document;

    fn doc_with_metadata(
        name: &str,
        order: &str,
        metadata: &[(&str, Option<&str>)],
    ) -> Document {
        Document {
            name: name.to_string(),
            order: order.to_string(),
            title: format!("Title {}", name),
            authors: vec!["Silva".to_string()],
            marked_for_deletion: false,
            is_ahead: false,
            is_ex_aop: false,
            short_id: None,
            persistent_id: None,
            previous_short_id: None,
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(|s| s.to_string())))
                .collect(),
        }
    }

    fn as_set(docs: Vec<Document>) -> DocumentSet<Document> {
        docs.into_iter().map(|d| (d.name.clone(), d)).collect()
    }

    #[test]
    fn test_common_values_conflict_detected() {
        let docs = as_set(vec![
            doc_with_metadata("a001", "00001", &[(labels::JOURNAL_TITLE, Some("Revista A"))]),
            doc_with_metadata("a002", "00002", &[(labels::JOURNAL_TITLE, Some("Revista B"))]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Preview);

        let conflicting = checker.conflicting_values();
        assert!(conflicting.contains_key(labels::JOURNAL_TITLE));
        let occ = &conflicting[labels::JOURNAL_TITLE];
        assert_eq!(occ.groups["Revista A"], vec!["a001".to_string()]);
        assert_eq!(occ.groups["Revista B"], vec!["a002".to_string()]);
    }

    #[test]
    fn test_common_values_missing_counts_as_group() {
        // issue label 缺失算一种取值,应判为分歧
        let docs = as_set(vec![
            doc_with_metadata("a001", "00001", &[(labels::ISSUE_LABEL, Some("v10n2"))]),
            doc_with_metadata("a002", "00002", &[]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Preview);

        let conflicting = checker.conflicting_values();
        assert!(conflicting.contains_key(labels::ISSUE_LABEL));
        assert_eq!(conflicting[labels::ISSUE_LABEL].missing, vec!["a002".to_string()]);
    }

    #[test]
    fn test_common_values_skip_missing_labels() {
        // e-ISSN 部分缺失属正常,不应算分歧
        let docs = as_set(vec![
            doc_with_metadata("a001", "00001", &[(labels::E_ISSN, Some("1234-5678"))]),
            doc_with_metadata("a002", "00002", &[]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Preview);

        let conflicting = checker.conflicting_values();
        assert!(!conflicting.contains_key(labels::E_ISSN));
    }

    #[test]
    fn test_missing_required_reports_direct_fields() {
        let docs = as_set(vec![
            doc_with_metadata(
                "a001",
                "00001",
                &[
                    (labels::JOURNAL_TITLE, Some("Revista A")),
                    (labels::PUBLISHER_NAME, Some("Editora X")),
                ],
            ),
            doc_with_metadata("a002", "00002", &[(labels::JOURNAL_TITLE, Some("Revista A"))]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Preview);

        let missing = checker.missing_required();
        // publisher name 只有 a002 缺失; journal ISSN 两篇都缺失
        assert_eq!(missing[labels::PUBLISHER_NAME], vec!["a002".to_string()]);
        assert_eq!(
            missing[labels::JOURNAL_ISSN],
            vec!["a001".to_string(), "a002".to_string()]
        );
        assert!(!missing.contains_key(labels::JOURNAL_TITLE));
    }

    #[test]
    fn test_unique_violation_order_severity_by_mode() {
        let docs = as_set(vec![
            doc_with_metadata("a001", "00005", &[]),
            doc_with_metadata("a002", "00005", &[]),
        ]);

        let registration = BatchChecker::new(&docs, RunMode::Registration);
        let violations = registration.unique_value_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].label, labels::ORDER);
        assert_eq!(violations[0].severity, Severity::BlockingError);
        assert_eq!(violations[0].names, vec!["a001".to_string(), "a002".to_string()]);

        let preview = BatchChecker::new(&docs, RunMode::Preview);
        let violations = preview.unique_value_violations();
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unique_violation_doi_fatal() {
        let docs = as_set(vec![
            doc_with_metadata("a001", "00001", &[(labels::DOI, Some("10.1590/x1"))]),
            doc_with_metadata("a002", "00002", &[(labels::DOI, Some("10.1590/x1"))]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Registration);

        let violations = checker.unique_value_violations();
        let doi = violations.iter().find(|v| v.label == labels::DOI);
        assert_eq!(doi.map(|v| v.severity), Some(Severity::FatalError));
    }

    #[test]
    fn test_unique_violation_skips_missing_values() {
        // doi 都缺失时不报重复
        let docs = as_set(vec![
            doc_with_metadata("a001", "00001", &[]),
            doc_with_metadata("a002", "00002", &[]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Registration);

        let violations = checker.unique_value_violations();
        assert!(violations.iter().all(|v| v.label != labels::DOI));
    }

    #[test]
    fn test_order_collisions_skip_deletion_marked() {
        let mut deleted = doc_with_metadata("a003", "00005", &[]);
        deleted.marked_for_deletion = true;
        let docs = as_set(vec![
            doc_with_metadata("a001", "00005", &[]),
            doc_with_metadata("a002", "00005", &[]),
            deleted,
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Registration);

        let collisions = checker.order_collisions();
        assert_eq!(
            collisions["00005"],
            vec!["a001".to_string(), "a002".to_string()]
        );
    }

    #[test]
    fn test_order_collisions_unique_orders_empty() {
        let docs = as_set(vec![
            doc_with_metadata("a001", "00001", &[]),
            doc_with_metadata("a002", "00002", &[]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Registration);
        assert!(checker.order_collisions().is_empty());
    }

    #[test]
    fn test_names_sorted_by_order() {
        let docs = as_set(vec![
            doc_with_metadata("b-art", "00002", &[]),
            doc_with_metadata("a-art", "00010", &[]),
            doc_with_metadata("c-art", "00001", &[]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Preview);
        assert_eq!(
            checker.names_sorted_by_order(),
            vec!["c-art".to_string(), "b-art".to_string(), "a-art".to_string()]
        );
    }

    #[test]
    fn test_has_ahead_documents() {
        let mut ahead = doc_with_metadata("a002", "00002", &[]);
        ahead.is_ahead = true;
        let docs = as_set(vec![doc_with_metadata("a001", "00001", &[]), ahead]);
        assert!(BatchChecker::new(&docs, RunMode::Preview).has_ahead_documents());

        let plain = as_set(vec![doc_with_metadata("a001", "00001", &[])]);
        assert!(!BatchChecker::new(&plain, RunMode::Preview).has_ahead_documents());
    }

    #[test]
    fn test_report_bundles_everything() {
        let docs = as_set(vec![
            doc_with_metadata("a001", "00005", &[(labels::JOURNAL_TITLE, Some("Revista A"))]),
            doc_with_metadata("a002", "00005", &[(labels::JOURNAL_TITLE, Some("Revista B"))]),
        ]);
        let checker = BatchChecker::new(&docs, RunMode::Registration);

        let report = checker.report();
        assert_eq!(report.mode, RunMode::Registration);
        assert!(report.conflicting_labels.contains(&labels::JOURNAL_TITLE.to_string()));
        assert!(report.has_blocking());
        assert_eq!(report.max_severity(), Some(Severity::BlockingError));
        assert!(report.order_collisions.contains_key("00005"));
    }
}
