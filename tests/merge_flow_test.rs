// ==========================================
// 批次合并流程集成测试
// ==========================================
// 测试目标: 验证 一致性检查 → 身份合并 → 标识调和 全流程
// ==========================================


use doc_registry::domain::labels;
use doc_registry::domain::{
    Disposition, DocumentSet, MergeEvent, PidSource, RunMode, Severity,
};
use doc_registry::engine::{BatchChecker, MergeEngine, PidReconciler};
use doc_registry::logging;
use test_helpers::{build_document, create_test_db, open_registry};

// ==========================================
// 测试用例
// ==========================================

/// 一个期次更新批: 更新、删除、新增、换序、回拒同时发生
#[test]
fn test_issue_update_batch_end_to_end() {
    logging::init_test();

    // 已注册状态
    let mut registered = DocumentSet::new();
    registered.insert(
        "a01".to_string(),
        build_document("a01", "1", "Vigilancia epidemiologica", &["Silva", "Souza"]),
    );
    registered.insert(
        "a02".to_string(),
        build_document("a02", "2", "Mortalidade infantil no nordeste", &["Costa"]),
    );
    registered.insert(
        "a03".to_string(),
        build_document("a03", "3", "Atencao primaria em saude", &["Lima", "Rocha"]),
    );
    let mut archived_aop = build_document("a04", "4", "Estudo multicentrico", &["Pereira"]);
    archived_aop.is_ex_aop = true;
    registered.insert("a04".to_string(), archived_aop);

    // 来稿批次
    let mut incoming = DocumentSet::new();
    // 同键相似 → 更新
    incoming.insert(
        "a01".to_string(),
        build_document("a01", "1", "Vigilancia epidemiologica", &["Silva", "Souza"]),
    );
    // 同键相似且要求删除
    let mut deletion = build_document("a02", "2", "Mortalidade infantil no nordeste", &["Costa"]);
    deletion.marked_for_deletion = true;
    incoming.insert("a02".to_string(), deletion);
    // 同名换序（3 → 7）
    incoming.insert(
        "a03".to_string(),
        build_document("a03", "7", "Atencao primaria em saude", &["Lima", "Rocha"]),
    );
    // ahead-of-print 来稿撞上已归档的 ex-aop → 回拒
    let mut ahead = build_document("a04", "4", "Estudo multicentrico", &["Pereira"]);
    ahead.is_ahead = true;
    incoming.insert("a04".to_string(), ahead);
    // 全新文献
    incoming.insert(
        "a05".to_string(),
        build_document("a05", "9", "Novo ensaio clinico", &["Almeida"]),
    );

    let outcome = MergeEngine::with_default_judge().merge(&registered, &incoming);

    // 终局处置
    assert_eq!(outcome.dispositions["a01"], Disposition::Accepted);
    assert_eq!(outcome.dispositions["a02"], Disposition::Deleted);
    assert_eq!(outcome.dispositions["a03"], Disposition::Accepted);
    assert_eq!(outcome.dispositions["a04"], Disposition::Rejected);
    assert_eq!(outcome.dispositions["a05"], Disposition::Accepted);

    // 合并结果
    assert!(outcome.merged.contains_key("a01"));
    assert!(!outcome.merged.contains_key("a02"), "删除后不应留在合并集");
    assert_eq!(outcome.merged["a03"].order, "7");
    // 回拒保留已注册版本（ex-aop 标志仍在,来稿的 ahead 标志未混入）
    assert!(outcome.merged["a04"].is_ex_aop);
    assert!(!outcome.merged["a04"].is_ahead);
    assert!(outcome.merged.contains_key("a05"));

    // 换序与排除簿记
    assert_eq!(
        outcome.order_changes["a03"],
        ("3".to_string(), "7".to_string())
    );
    assert!(outcome.excluded_orders.contains(&"2".to_string()));
    assert!(outcome.excluded_orders.contains(&"3".to_string()));

    // 历史轨迹抽查: 五个文献名各有一条轨迹
    assert_eq!(outcome.history.len(), 5);
    assert!(outcome.history.contains("a05"));
    assert_eq!(
        outcome.history.labels_for("a01"),
        vec!["registered article", "package", "accepted"]
    );
    assert!(outcome
        .history
        .events_for("a04")
        .contains(&MergeEvent::Rejected));
    assert!(outcome
        .history
        .events_for("a05")
        .contains(&MergeEvent::Created));

    // 报告行导出: 名称有序,标签为对外口径
    let rows = outcome.history.as_label_rows();
    assert!(rows.contains(&("a02".to_string(), "excluded article".to_string())));
    assert!(rows.contains(&("a05".to_string(), "created".to_string())));

    // 每篇来稿都有非空历史
    for name in incoming.keys() {
        assert!(!outcome.history.labels_for(name).is_empty());
    }
}

/// 接受的文献走标识调和,拿到稳定持久标识
#[test]
fn test_accepted_documents_receive_persistent_ids() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();

    let registered = DocumentSet::new();
    let mut incoming = DocumentSet::new();
    let mut doc = build_document("a01", "1", "Novo artigo", &["Silva"]);
    doc.short_id = Some("S0901".to_string());
    incoming.insert("a01".to_string(), doc);

    let outcome = MergeEngine::with_default_judge().merge(&registered, &incoming);
    assert_eq!(outcome.dispositions["a01"], Disposition::Accepted);

    let reconciler = PidReconciler::new(open_registry(&db_path).unwrap());
    let assignments = reconciler.assign_pids(&outcome.accepted).unwrap();

    assert_eq!(assignments.len(), 1);
    let assignment = &assignments["a01"];
    assert_eq!(assignment.source, PidSource::Generated);
    assert!(!assignment.persistent_id.is_empty());
    // 默认生成器: 无连字符 UUID
    assert!(!assignment.persistent_id.contains('-'));

    // 重跑同批: 标识保持不变
    let again = reconciler.assign_pids(&outcome.accepted).unwrap();
    assert_eq!(again["a01"].persistent_id, assignment.persistent_id);
    assert_eq!(again["a01"].source, PidSource::Adopted);
}

/// 批次一致性检查: 模式决定序号重复的严重级别
#[test]
fn test_batch_report_severity_depends_on_mode() {
    logging::init_test();

    let mut documents = DocumentSet::new();
    let mut first = build_document("a01", "1", "Artigo um", &["Silva"]);
    first
        .metadata
        .insert(labels::JOURNAL_TITLE.to_string(), Some("Revista X".to_string()));
    let mut second = build_document("a02", "1", "Artigo dois", &["Souza"]);
    second
        .metadata
        .insert(labels::JOURNAL_TITLE.to_string(), Some("Revista X".to_string()));
    documents.insert("a01".to_string(), first);
    documents.insert("a02".to_string(), second);

    let preview = BatchChecker::new(&documents, RunMode::Preview).report();
    let registration = BatchChecker::new(&documents, RunMode::Registration).report();

    // 序号重复: 预检告警,正式注册阻断
    assert_eq!(preview.max_severity(), Some(Severity::Warning));
    assert!(!preview.has_blocking());
    assert!(registration.has_blocking());

    // 两种模式都报出同一处序号冲突
    assert_eq!(preview.order_collisions["1"], vec!["a01", "a02"]);
    assert_eq!(registration.order_collisions["1"], vec!["a01", "a02"]);

    // 阻断项的对外文案
    let violation = registration
        .unique_value_violations
        .iter()
        .find(|v| v.label == labels::ORDER)
        .unwrap();
    assert_eq!(
        format!("{}: {} duplicated", violation.severity, violation.label),
        "BLOCKING ERROR: order duplicated"
    );
}
