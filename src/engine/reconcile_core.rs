// ==========================================
// 文献批次注册系统 - PID Reconcile Core 纯函数库
// ==========================================
// 职责: 根据存量登记行与请求三元组产出标识选择与写入计划
// 红线: 无状态、无副作用、无 I/O 操作,不触发标识生成
// ==========================================

use crate::domain::pid::{PidInsert, PidRecord, ReconcilePlan, ReconcileRequest};

// ==========================================
// PidChoice - 标识来源判定
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidChoice {
    /// 文档自带持久标识,覆盖登记
    Explicit(String),
    /// 采纳存量登记行中唯一（或裁决胜出）的持久标识
    Adopt(String),
    /// 无任何存量记录,需调用生成器产生新标识
    Generate,
}

impl PidChoice {
    /// 判定阶段已知的持久标识（Generate 分支为 None）
    pub fn known_pid(&self) -> Option<&str> {
        match self {
            PidChoice::Explicit(pid) | PidChoice::Adopt(pid) => Some(pid),
            PidChoice::Generate => None,
        }
    }
}

// ==========================================
// ReconcileDecision - 判定结果
// ==========================================
// 删除目标在判定时即可确定;插入行的持久标识要等
// 标识落定（生成器只在 Generate 分支、确有写入时调用）
#[derive(Debug, Clone)]
pub struct ReconcileDecision {
    pub choice: PidChoice,
    pub delete_by_persistent_id: Option<String>, // 覆盖登记: 清空引用该标识的全部行
    pub delete_by_alias: Vec<String>,            // 覆盖登记: 清空这些别名的全部行
    pub delete_row_ids: Vec<i64>,                // 精确删除: 失败方与冗余行
    pub insert_aliases: Vec<String>,             // 需要补写映射行的别名
}

impl ReconcileDecision {
    /// 存量状态已满足要求,无需任何写入
    pub fn is_settled(&self) -> bool {
        self.delete_by_persistent_id.is_none()
            && self.delete_by_alias.is_empty()
            && self.delete_row_ids.is_empty()
            && self.insert_aliases.is_empty()
    }

    /// 以落定的持久标识物化为写入计划
    pub fn into_plan(self, persistent_id: &str) -> ReconcilePlan {
        ReconcilePlan {
            delete_by_persistent_id: self.delete_by_persistent_id,
            delete_by_alias: self.delete_by_alias,
            delete_row_ids: self.delete_row_ids,
            inserts: self
                .insert_aliases
                .into_iter()
                .map(|alias| PidInsert {
                    alias,
                    persistent_id: persistent_id.to_string(),
                })
                .collect(),
        }
    }
}

// ==========================================
// ReconcileCore - 纯函数工具类
// ==========================================
pub struct ReconcileCore;

impl ReconcileCore {
    /// 标识调和判定
    ///
    /// # 规则
    /// 1. 请求自带 persistent_id → 覆盖登记:清空该标识与各别名的全部行,重写别名映射
    /// 2. 无自带标识、存量为空 → Generate,为各别名补写映射
    /// 3. 存量恰有一个持久标识 → 采纳;补写缺失别名,按最早行去重
    /// 4. 存量出现多个持久标识 → 裁决:优先 previous_short_id 所指,其次 short_id 所指,
    ///    同一别名内以最早行为准;失败方整行删除,胜出标识每别名保留一行
    ///
    /// # 参数
    /// - request: 标识三元组
    /// - existing: 按请求别名查出的存量登记行（顺序不限,内部按行号升序处理）
    ///
    /// # 返回
    /// - (ReconcileDecision, Vec<String>): 判定 + 决策原因
    pub fn resolve(
        request: &ReconcileRequest,
        existing: &[PidRecord],
    ) -> (ReconcileDecision, Vec<String>) {
        let mut rows: Vec<&PidRecord> = existing.iter().collect();
        rows.sort_by_key(|r| r.id);
        let aliases = request.aliases();

        if let Some(pid) = request
            .persistent_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        {
            return Self::resolve_explicit(pid, &aliases, &rows);
        }

        let distinct = Self::distinct_pids(&rows);
        match distinct.as_slice() {
            [] => Self::resolve_new(&aliases),
            [single] => Self::resolve_adopt(single, &aliases, &rows),
            [oldest, ..] => Self::resolve_conflict(request, oldest, &distinct, &aliases, &rows),
        }
    }

    /// 分支 1: 文档自带标识覆盖登记
    fn resolve_explicit(
        pid: &str,
        aliases: &[&str],
        rows: &[&PidRecord],
    ) -> (ReconcileDecision, Vec<String>) {
        let mut reasons = vec![format!("EXPLICIT: persistent_id={}", pid)];

        if Self::is_clean_state(pid, aliases, rows) {
            reasons.push("SETTLED: rows already consistent".to_string());
            let decision = ReconcileDecision {
                choice: PidChoice::Explicit(pid.to_string()),
                delete_by_persistent_id: None,
                delete_by_alias: Vec::new(),
                delete_row_ids: Vec::new(),
                insert_aliases: Vec::new(),
            };
            return (decision, reasons);
        }

        reasons.push(format!("REBUILD: aliases=[{}]", aliases.join(",")));
        let decision = ReconcileDecision {
            choice: PidChoice::Explicit(pid.to_string()),
            delete_by_persistent_id: Some(pid.to_string()),
            delete_by_alias: aliases.iter().map(|a| a.to_string()).collect(),
            delete_row_ids: Vec::new(),
            insert_aliases: aliases.iter().map(|a| a.to_string()).collect(),
        };
        (decision, reasons)
    }

    /// 分支 2a: 无存量记录,生成新标识
    fn resolve_new(aliases: &[&str]) -> (ReconcileDecision, Vec<String>) {
        let reasons = vec![format!("NEW: no stored rows, aliases=[{}]", aliases.join(","))];
        let decision = ReconcileDecision {
            choice: PidChoice::Generate,
            delete_by_persistent_id: None,
            delete_by_alias: Vec::new(),
            delete_row_ids: Vec::new(),
            insert_aliases: aliases.iter().map(|a| a.to_string()).collect(),
        };
        (decision, reasons)
    }

    /// 分支 2b: 存量标识唯一,采纳并修补别名行
    fn resolve_adopt(
        pid: &str,
        aliases: &[&str],
        rows: &[&PidRecord],
    ) -> (ReconcileDecision, Vec<String>) {
        let mut reasons = vec![format!("ADOPT: persistent_id={}", pid)];
        let mut delete_row_ids = Vec::new();
        let mut insert_aliases = Vec::new();

        for alias in aliases {
            let matching: Vec<&&PidRecord> = rows.iter().filter(|r| r.alias == *alias).collect();
            match matching.as_slice() {
                [] => insert_aliases.push(alias.to_string()),
                [_keep, surplus @ ..] => {
                    delete_row_ids.extend(surplus.iter().map(|r| r.id));
                }
            }
        }

        if !insert_aliases.is_empty() {
            reasons.push(format!("BACKFILL: aliases=[{}]", insert_aliases.join(",")));
        }
        if !delete_row_ids.is_empty() {
            reasons.push(format!("DEDUP: surplus_rows={}", delete_row_ids.len()));
        }
        if insert_aliases.is_empty() && delete_row_ids.is_empty() {
            reasons.push("SETTLED: rows already consistent".to_string());
        }

        let decision = ReconcileDecision {
            choice: PidChoice::Adopt(pid.to_string()),
            delete_by_persistent_id: None,
            delete_by_alias: Vec::new(),
            delete_row_ids,
            insert_aliases,
        };
        (decision, reasons)
    }

    /// 分支 2c: 存量标识冲突,确定性裁决
    ///
    /// # 规则
    /// - 胜出标识: previous_short_id 别名的最早行;该别名无行时取 short_id 别名的最早行
    /// - 每个别名保留一行胜出标识（最早行）,其余整行删除
    /// - 无胜出行的别名补写映射
    fn resolve_conflict(
        request: &ReconcileRequest,
        oldest_pid: &str,
        distinct: &[&str],
        aliases: &[&str],
        rows: &[&PidRecord],
    ) -> (ReconcileDecision, Vec<String>) {
        let mut priority: Vec<&str> = Vec::new();
        if let Some(prev) = request.previous_short_id.as_deref() {
            if !prev.is_empty() {
                priority.push(prev);
            }
        }
        priority.push(request.short_id.as_str());

        let winner = priority
            .iter()
            .find_map(|alias| Self::first_pid_for_alias(rows, alias))
            .unwrap_or(oldest_pid);

        let mut reasons = vec![
            format!("CONFLICT: distinct_pids={}", distinct.len()),
            format!("WINNER: persistent_id={}", winner),
        ];

        let mut delete_row_ids = Vec::new();
        let mut insert_aliases = Vec::new();
        for alias in aliases {
            let keeper = rows
                .iter()
                .find(|r| r.alias == *alias && r.persistent_id == winner)
                .map(|r| r.id);
            match keeper {
                Some(keep_id) => {
                    delete_row_ids.extend(
                        rows.iter()
                            .filter(|r| r.alias == *alias && r.id != keep_id)
                            .map(|r| r.id),
                    );
                }
                None => {
                    delete_row_ids
                        .extend(rows.iter().filter(|r| r.alias == *alias).map(|r| r.id));
                    insert_aliases.push(alias.to_string());
                }
            }
        }

        if !delete_row_ids.is_empty() {
            reasons.push(format!("PURGE: losing_rows={}", delete_row_ids.len()));
        }

        let decision = ReconcileDecision {
            choice: PidChoice::Adopt(winner.to_string()),
            delete_by_persistent_id: None,
            delete_by_alias: Vec::new(),
            delete_row_ids,
            insert_aliases,
        };
        (decision, reasons)
    }

    /// 目标状态校验: 每个别名恰有一行指向 pid,且无游离行
    fn is_clean_state(pid: &str, aliases: &[&str], rows: &[&PidRecord]) -> bool {
        rows.len() == aliases.len()
            && aliases.iter().all(|alias| {
                rows.iter()
                    .filter(|r| r.alias == *alias && r.persistent_id == pid)
                    .count()
                    == 1
            })
    }

    /// 按行号升序首次出现的持久标识列表
    fn distinct_pids<'a>(rows: &[&'a PidRecord]) -> Vec<&'a str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in rows {
            if !seen.contains(&row.persistent_id.as_str()) {
                seen.push(row.persistent_id.as_str());
            }
        }
        seen
    }

    /// 某别名最早一行的持久标识
    fn first_pid_for_alias<'a>(rows: &[&'a PidRecord], alias: &str) -> Option<&'a str> {
        rows.iter()
            .find(|r| r.alias == alias)
            .map(|r| r.persistent_id.as_str())
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(id: i64, alias: &str, pid: &str) -> PidRecord {
        PidRecord {
            id,
            alias: alias.to_string(),
            persistent_id: pid.to_string(),
            created_at: Utc::now(),
        }
    }

    fn request(short: &str, pid: Option<&str>, prev: Option<&str>) -> ReconcileRequest {
        ReconcileRequest::new(
            short,
            pid.map(|s| s.to_string()),
            prev.map(|s| s.to_string()),
        )
    }

    // ==========================================
    // 测试 1: 显式标识覆盖登记
    // ==========================================

    #[test]
    fn test_explicit_pid_rebuilds_aliases() {
        let req = request("S0001", Some("P-NEW"), Some("S0000"));
        let existing = vec![row(1, "S0001", "P-OLD"), row(2, "X9999", "P-NEW")];

        let (decision, reasons) = ReconcileCore::resolve(&req, &existing);

        assert_eq!(decision.choice, PidChoice::Explicit("P-NEW".to_string()));
        assert_eq!(
            decision.delete_by_persistent_id,
            Some("P-NEW".to_string())
        );
        assert_eq!(decision.delete_by_alias, vec!["S0001", "S0000"]);
        assert_eq!(decision.insert_aliases, vec!["S0001", "S0000"]);
        assert!(reasons.iter().any(|r| r.starts_with("EXPLICIT:")));
    }

    #[test]
    fn test_explicit_pid_settled_state_is_noop() {
        let req = request("S0001", Some("P1"), Some("S0000"));
        let existing = vec![row(1, "S0001", "P1"), row(2, "S0000", "P1")];

        let (decision, reasons) = ReconcileCore::resolve(&req, &existing);

        assert!(decision.is_settled());
        assert!(decision.into_plan("P1").is_noop());
        assert!(reasons.iter().any(|r| r.starts_with("SETTLED:")));
    }

    #[test]
    fn test_explicit_pid_blank_string_treated_as_absent() {
        let req = request("S0001", Some("   "), None);

        let (decision, _) = ReconcileCore::resolve(&req, &[]);

        assert_eq!(decision.choice, PidChoice::Generate);
    }

    // ==========================================
    // 测试 2: 无存量记录
    // ==========================================

    #[test]
    fn test_no_rows_generates_and_inserts_all_aliases() {
        let req = request("S0001", None, Some("S0000"));

        let (decision, reasons) = ReconcileCore::resolve(&req, &[]);

        assert_eq!(decision.choice, PidChoice::Generate);
        assert!(decision.choice.known_pid().is_none());
        assert_eq!(decision.insert_aliases, vec!["S0001", "S0000"]);
        assert!(decision.delete_row_ids.is_empty());
        assert!(reasons.iter().any(|r| r.starts_with("NEW:")));
    }

    #[test]
    fn test_aliases_deduplicate_previous_equal_to_short() {
        let req = request("S0001", None, Some("S0001"));

        let (decision, _) = ReconcileCore::resolve(&req, &[]);

        assert_eq!(decision.insert_aliases, vec!["S0001"]);
    }

    // ==========================================
    // 测试 3: 采纳唯一存量标识
    // ==========================================

    #[test]
    fn test_single_pid_adopted_and_missing_alias_backfilled() {
        let req = request("S0001", None, Some("S0000"));
        let existing = vec![row(1, "S0000", "P1")];

        let (decision, reasons) = ReconcileCore::resolve(&req, &existing);

        assert_eq!(decision.choice, PidChoice::Adopt("P1".to_string()));
        assert_eq!(decision.insert_aliases, vec!["S0001"]);
        assert!(decision.delete_row_ids.is_empty());
        assert!(reasons.iter().any(|r| r.starts_with("BACKFILL:")));
    }

    #[test]
    fn test_single_pid_surplus_rows_deduped_keeping_oldest() {
        let req = request("S0001", None, None);
        let existing = vec![
            row(3, "S0001", "P1"),
            row(7, "S0001", "P1"),
            row(9, "S0001", "P1"),
        ];

        let (decision, _) = ReconcileCore::resolve(&req, &existing);

        assert_eq!(decision.choice, PidChoice::Adopt("P1".to_string()));
        assert_eq!(decision.delete_row_ids, vec![7, 9]);
        assert!(decision.insert_aliases.is_empty());
    }

    #[test]
    fn test_single_pid_consistent_rows_settled() {
        let req = request("S0001", None, Some("S0000"));
        let existing = vec![row(1, "S0001", "P1"), row(2, "S0000", "P1")];

        let (decision, reasons) = ReconcileCore::resolve(&req, &existing);

        assert!(decision.is_settled());
        assert_eq!(decision.choice, PidChoice::Adopt("P1".to_string()));
        assert!(reasons.iter().any(|r| r.starts_with("SETTLED:")));
    }

    // ==========================================
    // 测试 4: 标识冲突裁决
    // ==========================================

    #[test]
    fn test_conflict_prefers_previous_short_id_pid() {
        let req = request("S0001", None, Some("S0000"));
        let existing = vec![row(1, "S0001", "P-SHORT"), row(2, "S0000", "P-PREV")];

        let (decision, reasons) = ReconcileCore::resolve(&req, &existing);

        assert_eq!(decision.choice, PidChoice::Adopt("P-PREV".to_string()));
        // S0001 无胜出行: 原行删除,补写映射
        assert_eq!(decision.delete_row_ids, vec![1]);
        assert_eq!(decision.insert_aliases, vec!["S0001"]);
        assert!(reasons.iter().any(|r| r == "WINNER: persistent_id=P-PREV"));
    }

    #[test]
    fn test_conflict_falls_back_to_short_id_pid() {
        let req = request("S0001", None, Some("S0000"));
        // previous_short_id 无存量行,short_id 别名内部冲突
        let existing = vec![row(4, "S0001", "P-A"), row(8, "S0001", "P-B")];

        let (decision, _) = ReconcileCore::resolve(&req, &existing);

        // 同一别名取最早行
        assert_eq!(decision.choice, PidChoice::Adopt("P-A".to_string()));
        assert_eq!(decision.delete_row_ids, vec![8]);
        // previous_short_id 别名无任何行,补写
        assert_eq!(decision.insert_aliases, vec!["S0000"]);
    }

    #[test]
    fn test_conflict_keeps_one_winning_row_per_alias() {
        let req = request("S0001", None, Some("S0000"));
        let existing = vec![
            row(1, "S0000", "P-KEEP"),
            row(2, "S0000", "P-KEEP"),
            row(3, "S0001", "P-DROP"),
            row(4, "S0001", "P-KEEP"),
        ];

        let (decision, _) = ReconcileCore::resolve(&req, &existing);

        assert_eq!(decision.choice, PidChoice::Adopt("P-KEEP".to_string()));
        // S0000 冗余胜出行 2、S0001 失败行 3 删除;行 1 与行 4 各为其别名保留行
        assert_eq!(decision.delete_row_ids, vec![3, 2]);
        assert!(decision.insert_aliases.is_empty());
    }

    // ==========================================
    // 测试 5: 计划物化
    // ==========================================

    #[test]
    fn test_into_plan_materializes_inserts_with_pid() {
        let req = request("S0001", None, Some("S0000"));
        let (decision, _) = ReconcileCore::resolve(&req, &[]);

        let plan = decision.into_plan("P-GEN");

        assert_eq!(
            plan.inserts,
            vec![
                PidInsert {
                    alias: "S0001".to_string(),
                    persistent_id: "P-GEN".to_string(),
                },
                PidInsert {
                    alias: "S0000".to_string(),
                    persistent_id: "P-GEN".to_string(),
                },
            ]
        );
        assert!(plan.delete_by_persistent_id.is_none());
        assert!(plan.delete_row_ids.is_empty());
    }

    // ==========================================
    // 测试 6: 幂等性
    // ==========================================

    #[test]
    fn test_second_run_after_generate_is_settled_adopt() {
        let req = request("S0001", None, Some("S0000"));

        // 首轮: 生成并写入两个别名
        let (first, _) = ReconcileCore::resolve(&req, &[]);
        assert_eq!(first.choice, PidChoice::Generate);

        // 次轮: 以首轮写入后的存量行再次判定
        let existing = vec![row(1, "S0001", "P-GEN"), row(2, "S0000", "P-GEN")];
        let (second, _) = ReconcileCore::resolve(&req, &existing);

        assert_eq!(second.choice, PidChoice::Adopt("P-GEN".to_string()));
        assert!(second.is_settled());
    }
}
