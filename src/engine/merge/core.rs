// ==========================================
// 身份合并引擎 - 核心实现
// ==========================================
// 流程: 播种历史 → 分类 → 执行动作 → 两级冲突消解 → 产出结果
// ==========================================

use crate::domain::document::{DocumentFields, DocumentSet};
use crate::domain::history::{HistoryTrail, MergeEvent};
use crate::domain::types::{ConflictKind, Disposition, MergeAction, RunMode};
use crate::engine::batch_check::BatchChecker;
use crate::engine::similarity::{SimilarityJudge, TitleAuthorJudge};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

// ==========================================
// MergeOutcome - 合并结果
// ==========================================
// 全部为新构造的值,输入集合不受影响
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome<D> {
    // ===== 集合 =====
    pub merged: DocumentSet<D>,   // 合并集（已注册副本 + 被接受的来稿）
    pub accepted: DocumentSet<D>, // 本次被接受的来稿
    pub rejected: Vec<String>,    // 分类阶段直接拒绝的文献名

    // ===== 历史 =====
    pub history: HistoryTrail, // 每个文献名的事件序列

    // ===== 未解决冲突 =====
    pub titaut_conflicts: BTreeMap<String, DocumentSet<D>>, // 名称 → 相似候选（已注册）
    pub order_name_conflicts: BTreeMap<String, DocumentSet<D>>, // 名称 → 冲突候选

    // ===== 变更登记 =====
    pub name_changes: BTreeMap<String, String>, // 新名称 → 被取代的旧名称
    pub order_changes: BTreeMap<String, (String, String)>, // 名称 → (旧序号, 新序号)

    // ===== 删除登记 =====
    pub excluded_items: BTreeMap<String, String>, // 被删除文献名 → 序号
    pub excluded_orders: Vec<String>,             // 退出合并集的序号（删除 + 序号变更的旧序号）

    // ===== 终态 =====
    pub dispositions: BTreeMap<String, Disposition>, // 每篇来稿的终态
}

impl<D> MergeOutcome<D> {
    /// 来稿是否被接受
    pub fn is_accepted(&self, name: &str) -> bool {
        matches!(self.dispositions.get(name), Some(Disposition::Accepted))
    }

    /// 未解决冲突总数（两级合计）
    pub fn unresolved_count(&self) -> usize {
        self.titaut_conflicts.len() + self.order_name_conflicts.len()
    }
}

// ==========================================
// MergeEngine - 身份合并引擎
// ==========================================
pub struct MergeEngine<D: DocumentFields + Clone> {
    judge: Box<dyn SimilarityJudge<D>>,
}

impl<D: DocumentFields + Clone> MergeEngine<D> {
    /// 注入相似度判定器构造引擎
    pub fn new(judge: Box<dyn SimilarityJudge<D>>) -> Self {
        Self { judge }
    }

    /// 使用默认标题/作者判定器构造引擎
    pub fn with_default_judge() -> Self {
        Self {
            judge: Box::new(TitleAuthorJudge::default()),
        }
    }

    /// 合并批次来稿与已注册文献
    ///
    /// # 参数
    /// - `registered`: 已注册文献集合（只读）
    /// - `incoming`: 批次来稿集合（只读）
    ///
    /// # 返回
    /// MergeOutcome,其中每篇来稿恰好落在一个终态,历史轨迹完整
    #[instrument(skip(self, registered, incoming))]
    pub fn merge(
        &self,
        registered: &DocumentSet<D>,
        incoming: &DocumentSet<D>,
    ) -> MergeOutcome<D> {
        info!(
            registered = registered.len(),
            incoming = incoming.len(),
            "开始合并批次"
        );

        let run = MergeRun::new(self.judge.as_ref(), registered, incoming);
        let outcome = run.run();

        info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            unresolved = outcome.unresolved_count(),
            merged = outcome.merged.len(),
            "批次合并完成"
        );
        outcome
    }
}

// ==========================================
// MergeRun - 单次合并的内部状态
// ==========================================
struct MergeRun<'a, D: DocumentFields + Clone> {
    judge: &'a dyn SimilarityJudge<D>,
    registered: &'a DocumentSet<D>,
    incoming: &'a DocumentSet<D>,
    order_collisions: BTreeMap<String, Vec<String>>,

    merged: DocumentSet<D>,
    accepted: DocumentSet<D>,
    rejected: Vec<String>,
    history: HistoryTrail,
    titaut_conflicts: BTreeMap<String, DocumentSet<D>>,
    order_name_conflicts: BTreeMap<String, DocumentSet<D>>,
    name_changes: BTreeMap<String, String>,
    order_changes: BTreeMap<String, (String, String)>,
    excluded_items: BTreeMap<String, String>,
    excluded_orders: Vec<String>,
    dispositions: BTreeMap<String, Disposition>,
}

impl<'a, D: DocumentFields + Clone> MergeRun<'a, D> {
    fn new(
        judge: &'a dyn SimilarityJudge<D>,
        registered: &'a DocumentSet<D>,
        incoming: &'a DocumentSet<D>,
    ) -> Self {
        // 批次内序号冲突由一致性检查器判定（剔除删除标记）
        let order_collisions = BatchChecker::new(incoming, RunMode::Registration).order_collisions();
        Self {
            judge,
            registered,
            incoming,
            order_collisions,
            merged: DocumentSet::new(),
            accepted: DocumentSet::new(),
            rejected: Vec::new(),
            history: HistoryTrail::new(),
            titaut_conflicts: BTreeMap::new(),
            order_name_conflicts: BTreeMap::new(),
            name_changes: BTreeMap::new(),
            order_changes: BTreeMap::new(),
            excluded_items: BTreeMap::new(),
            excluded_orders: Vec::new(),
            dispositions: BTreeMap::new(),
        }
    }

    fn run(mut self) -> MergeOutcome<D> {
        // 入场登记
        for name in self.registered.keys() {
            self.history.record(name, MergeEvent::RegisteredArticle);
        }
        for name in self.incoming.keys() {
            self.history.record(name, MergeEvent::Package);
        }

        // 分类
        let actions = self.classify();
        debug!(actions = actions.len(), "来稿分类完成");

        // 合并集从已注册副本出发
        self.merged = self.registered.clone();

        let to_reject = names_for(&actions, MergeAction::Reject);
        let to_delete = names_for(&actions, MergeAction::Delete);
        let to_update = names_for(&actions, MergeAction::Update);
        let to_titaut = names_for(&actions, MergeAction::NeedsTitautResolution);
        let to_order_name = names_for(&actions, MergeAction::NeedsOrderNameResolution);

        self.reject_articles(&to_reject);
        self.delete_articles(&to_delete);
        self.update_articles(&to_update);
        self.resolve_titaut_conflicts(&to_titaut);
        self.resolve_order_and_name_issues(&to_order_name, &to_delete);

        MergeOutcome {
            merged: self.merged,
            accepted: self.accepted,
            rejected: self.rejected,
            history: self.history,
            titaut_conflicts: self.titaut_conflicts,
            order_name_conflicts: self.order_name_conflicts,
            name_changes: self.name_changes,
            order_changes: self.order_changes,
            excluded_items: self.excluded_items,
            excluded_orders: self.excluded_orders,
            dispositions: self.dispositions,
        }
    }

    // ==========================================
    // 分类
    // ==========================================

    /// 为每篇来稿判定初始动作
    ///
    /// # 规则
    /// - 已注册文献中存在 (序号, 名称) 完全一致者:
    ///   - 来稿 is_ahead 且 注册方 is_ex_aop → Reject
    ///     (单向规则: ex-aop 文献不接受回退为 ahead-of-print 的来稿,
    ///      反向情况不触发)
    ///   - 默认比较不相似 → NeedsTitautResolution
    ///   - 来稿带删除标记 → Delete
    ///   - 其余 → Update
    /// - 无键匹配 → NeedsOrderNameResolution
    fn classify(&self) -> BTreeMap<String, MergeAction> {
        let mut actions = BTreeMap::new();
        for (name, doc) in self.incoming {
            let action = match self.registered.get(name) {
                Some(reg) if reg.order() == doc.order() => {
                    if doc.is_ahead() && reg.is_ex_aop() {
                        MergeAction::Reject
                    } else if !self.judge.are_similar(reg, doc, false, false) {
                        MergeAction::NeedsTitautResolution
                    } else if doc.marked_for_deletion() {
                        MergeAction::Delete
                    } else {
                        MergeAction::Update
                    }
                }
                _ => MergeAction::NeedsOrderNameResolution,
            };
            actions.insert(name.clone(), action);
        }
        actions
    }

    // ==========================================
    // 动作执行
    // ==========================================

    fn reject_articles(&mut self, names: &[String]) {
        for name in names {
            self.history.record(name, MergeEvent::Rejected);
            self.dispositions.insert(name.clone(), Disposition::Rejected);
        }
        self.rejected = names.to_vec();
    }

    fn delete_articles(&mut self, names: &[String]) {
        for name in names {
            self.merged.remove(name);
            self.history.record(name, MergeEvent::Excluded);
            self.dispositions.insert(name.clone(), Disposition::Deleted);
        }
    }

    fn update_articles(&mut self, names: &[String]) {
        for name in names {
            self.history.record(name, MergeEvent::Accepted);
            self.accept(name);
        }
    }

    /// 把来稿写入 合并集 + 接受集,登记终态
    fn accept(&mut self, name: &str) {
        if let Some(doc) = self.incoming.get(name) {
            let doc = doc.clone();
            self.accepted.insert(name.to_string(), doc.clone());
            self.merged.insert(name.to_string(), doc);
            self.dispositions.insert(name.to_string(), Disposition::Accepted);
        }
    }

    // ==========================================
    // 标题/作者冲突消解
    // ==========================================

    /// 对 NeedsTitautResolution 的来稿做全库相似扫描
    ///
    /// # 规则
    /// - 无相似者,或唯一相似者就是同名文献 → 视为解决,接受
    /// - 其余 → 冲突成立,记录候选并拒绝
    fn resolve_titaut_conflicts(&mut self, names: &[String]) {
        for name in names {
            let similars = self.similar_registered_docs(name);
            self.history.record(name, MergeEvent::TitautConflict);

            let solvable =
                similars.is_empty() || (similars.len() == 1 && similars.contains_key(name));
            if solvable {
                self.history.record(name, MergeEvent::Solved);
                self.accept(name);
            } else {
                debug!(name = %name, candidates = similars.len(), "标题/作者冲突未解决");
                self.titaut_conflicts.insert(name.clone(), similars);
                self.history.record(name, MergeEvent::Rejected);
                self.dispositions
                    .insert(name.clone(), Disposition::UnresolvedTitaut);
            }
        }
    }

    /// 扫描整个已注册集合,返回与来稿相似的文献
    fn similar_registered_docs(&self, name: &str) -> DocumentSet<D> {
        let mut similars = DocumentSet::new();
        if let Some(doc) = self.incoming.get(name) {
            for (reg_name, reg) in self.registered {
                if self.judge.are_similar(reg, doc, false, false) {
                    similars.insert(reg_name.clone(), reg.clone());
                }
            }
        }
        similars
    }

    // ==========================================
    // 序号/名称冲突消解
    // ==========================================

    fn resolve_order_and_name_issues(&mut self, names: &[String], deleted: &[String]) {
        for name in names {
            self.history.record(name, MergeEvent::CheckOrderAndName);
        }

        let solved = self.evaluate_order_and_name(names, deleted);
        for name in &solved {
            self.history.record(name, MergeEvent::Solved);
            self.accept(name);
        }

        // 名称变更: 旧名称退出合并集
        let replaced: Vec<String> = self.name_changes.values().cloned().collect();
        for old_name in replaced {
            self.merged.remove(&old_name);
        }

        // 删除与序号变更的登记
        for name in deleted {
            if let Some(doc) = self.incoming.get(name) {
                let order = doc.order().to_string();
                self.excluded_items.insert(name.clone(), order.clone());
                self.excluded_orders.push(order);
            }
        }
        self.excluded_orders
            .extend(self.order_changes.values().map(|(previous, _)| previous.clone()));
    }

    /// 序号/名称消解的逐篇判定,返回解决的文献名
    ///
    /// # 规则
    /// - 序号与批次内其他来稿重复 → 批次内序号冲突,候选为同序号来稿
    /// - 其余按 (found_by_name, found_by_order) 裁决:
    ///   - 都不存在 → 全新文献
    ///   - 指向两篇不同文献 → 序号/名称冲突
    ///   - 仅命中名称 → 忽略序号比较相似则按序号变更解决
    ///   - 仅命中序号 → 忽略名称比较相似则按名称变更解决
    /// - 本轮已删除的名称不参与命中
    fn evaluate_order_and_name(&mut self, names: &[String], deleted: &[String]) -> Vec<String> {
        let mut solved = Vec::new();
        for name in names {
            let doc = match self.incoming.get(name) {
                Some(doc) => doc.clone(),
                None => continue,
            };
            let order = doc.order().to_string();

            // 批次内序号重复
            if let Some(colliders) = self.order_collisions.get(&order).cloned() {
                let mut candidates = DocumentSet::new();
                for other in colliders.iter().filter(|other| *other != name) {
                    if let Some(other_doc) = self.incoming.get(other) {
                        candidates.insert(other.clone(), other_doc.clone());
                    }
                }
                self.order_name_conflicts.insert(name.clone(), candidates);
                self.history.record(name, MergeEvent::PkgOrderConflict);
                self.dispositions.insert(
                    name.clone(),
                    Disposition::UnresolvedOrderName(ConflictKind::PkgOrderConflict),
                );
                continue;
            }

            // 已注册集合中按序号/名称命中
            let with_same_order: Vec<&String> = self
                .registered
                .iter()
                .filter(|(_, reg)| reg.order() == order)
                .map(|(reg_name, _)| reg_name)
                .collect();
            let mut found_by_order = if with_same_order.len() == 1 {
                Some(with_same_order[0].clone())
            } else {
                None
            };
            let mut found_by_name = if self.registered.contains_key(name) {
                Some(name.clone())
            } else {
                None
            };
            if found_by_name
                .as_deref()
                .is_some_and(|n| deleted.iter().any(|d| d == n))
            {
                found_by_name = None;
            }
            if found_by_order
                .as_deref()
                .is_some_and(|n| deleted.iter().any(|d| d == n))
            {
                found_by_order = None;
            }

            match (found_by_name, found_by_order) {
                (None, None) => {
                    solved.push(name.clone());
                    self.history.record(name, MergeEvent::Created);
                }
                (Some(by_name), Some(by_order)) if by_name != by_order => {
                    let mut candidates = DocumentSet::new();
                    if let Some(reg) = self.registered.get(&by_name) {
                        candidates.insert(by_name.clone(), reg.clone());
                    }
                    if let Some(reg) = self.registered.get(&by_order) {
                        candidates.insert(by_order.clone(), reg.clone());
                    }
                    self.order_name_conflicts.insert(name.clone(), candidates);
                    self.history.record(name, MergeEvent::OrderAndNameConflict);
                    self.dispositions.insert(
                        name.clone(),
                        Disposition::UnresolvedOrderName(ConflictKind::OrderAndNameConflict),
                    );
                }
                (Some(by_name), _) => {
                    // 序号未命中(或与名称命中同篇),忽略序号比较
                    if self.registered_similar(&by_name, &doc, false, true) {
                        solved.push(name.clone());
                        let previous = self
                            .registered
                            .get(&by_name)
                            .map(|reg| reg.order().to_string())
                            .unwrap_or_default();
                        self.order_changes
                            .insert(name.clone(), (previous, order.clone()));
                        self.history.record(name, MergeEvent::OrderChanged);
                    } else {
                        self.record_unmatched(name, &by_name);
                    }
                }
                (None, Some(by_order)) => {
                    // 名称未命中,忽略名称比较
                    if self.registered_similar(&by_order, &doc, true, false) {
                        solved.push(name.clone());
                        self.name_changes.insert(name.clone(), by_order.clone());
                        self.history.record(name, MergeEvent::NameChanged);
                        self.history
                            .record(name, MergeEvent::Replaces(by_order.clone()));
                        self.history
                            .record(&by_order, MergeEvent::ReplacedBy(name.clone()));
                    } else {
                        self.record_unmatched(name, &by_order);
                    }
                }
            }
        }
        solved
    }

    /// 已注册文献与来稿的相似判定
    fn registered_similar(
        &self,
        registered_name: &str,
        doc: &D,
        ignore_name: bool,
        ignore_order: bool,
    ) -> bool {
        match self.registered.get(registered_name) {
            Some(reg) => self.judge.are_similar(reg, doc, ignore_name, ignore_order),
            None => false,
        }
    }

    /// 登记"命中候选但相似度不足"的冲突
    fn record_unmatched(&mut self, name: &str, candidate: &str) {
        let mut candidates = DocumentSet::new();
        if let Some(reg) = self.registered.get(candidate) {
            candidates.insert(candidate.to_string(), reg.clone());
        }
        self.order_name_conflicts.insert(name.to_string(), candidates);
        self.history.record(name, MergeEvent::Unmatched);
        self.dispositions.insert(
            name.to_string(),
            Disposition::UnresolvedOrderName(ConflictKind::Unmatched),
        );
    }
}

/// 从分类结果中取出指定动作的文献名（按名称有序）
fn names_for(actions: &BTreeMap<String, MergeAction>, wanted: MergeAction) -> Vec<String> {
    actions
        .iter()
        .filter(|(_, action)| **action == wanted)
        .map(|(name, _)| name.clone())
        .collect()
}
