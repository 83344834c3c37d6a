// ==========================================
// 文献批次注册系统 - 持久标识调和服务
// ==========================================
// 职责: 整合调和流程,从查询到落库
// 流程: 按别名查询 → 纯函数判定 → 必要时生成 → 单事务执行计划
// 红线: 生成器只在确属新文献时调用;幂等重跑零写入
// ==========================================

use crate::domain::document::{DocumentFields, DocumentSet};
use crate::domain::pid::{PidAssignment, ReconcileRequest};
use crate::domain::types::PidSource;
use crate::engine::reconcile_core::{PidChoice, ReconcileCore};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::PidRegistryRepository;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PidGenerator - 标识生成器契约
// ==========================================
pub trait PidGenerator: Send + Sync {
    /// 产生一个全局唯一的持久标识
    fn generate(&self) -> String;
}

/// 默认生成器: 无连字符的 UUIDv4
pub struct UuidPidGenerator;

impl PidGenerator for UuidPidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

// ==========================================
// PidReconciler - 持久标识调和服务
// ==========================================
pub struct PidReconciler<R>
where
    R: PidRegistryRepository,
{
    // 数据访问层
    repo: R,

    // 标识生成器
    generator: Box<dyn PidGenerator>,
}

impl<R> PidReconciler<R>
where
    R: PidRegistryRepository,
{
    /// 创建调和服务,使用默认 UUID 生成器
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            generator: Box::new(UuidPidGenerator),
        }
    }

    /// 创建调和服务并指定生成器
    pub fn with_generator(repo: R, generator: Box<dyn PidGenerator>) -> Self {
        Self { repo, generator }
    }

    /// 调和一篇文献的持久标识
    ///
    /// # 流程
    /// 1. 按别名查出存量登记行
    /// 2. ReconcileCore 纯函数判定标识来源与写入计划
    /// 3. 仅 Generate 分支调用生成器
    /// 4. 计划非空时在单事务内执行;已一致则零写入
    ///
    /// # 返回
    /// - Ok(PidAssignment): 最终标识三元组 + 来历 + 决策原因
    /// - Err(...): 存储故障,当前批次应中止
    #[instrument(skip(self, request), fields(short_id = %request.short_id))]
    pub fn reconcile(&self, request: &ReconcileRequest) -> RepositoryResult<PidAssignment> {
        let aliases = request.aliases();
        let existing = self.repo.find_by_aliases(&aliases)?;
        debug!(rows = existing.len(), "存量登记行已载入");

        let (decision, mut reasons) = ReconcileCore::resolve(request, &existing);

        let source = match &decision.choice {
            PidChoice::Explicit(_) => PidSource::Explicit,
            PidChoice::Adopt(_) => PidSource::Adopted,
            PidChoice::Generate => PidSource::Generated,
        };

        let persistent_id = match decision.choice.known_pid() {
            Some(pid) => pid.to_string(),
            None => {
                let generated = self.generator.generate();
                if generated.trim().is_empty() {
                    return Err(RepositoryError::InternalError(
                        "标识生成器返回空值".to_string(),
                    ));
                }
                reasons.push(format!("GENERATED: persistent_id={}", generated));
                generated
            }
        };

        let plan = decision.into_plan(&persistent_id);
        if plan.is_noop() {
            debug!(persistent_id = %persistent_id, "登记已一致,零写入");
        } else {
            let stats = self.repo.apply_plan(&plan)?;
            info!(
                persistent_id = %persistent_id,
                deleted = stats.deleted,
                inserted = stats.inserted,
                "标识调和落库完成"
            );
        }

        Ok(PidAssignment {
            short_id: request.short_id.clone(),
            persistent_id,
            previous_short_id: request.previous_short_id.clone(),
            source,
            reasons,
        })
    }

    /// 为整批文献调和持久标识
    ///
    /// # 规则
    /// - 缺少短标识的文献跳过并告警,不计入结果
    /// - 任一文献的存储故障即中止整批
    #[instrument(skip(self, documents))]
    pub fn assign_pids<D: DocumentFields>(
        &self,
        documents: &DocumentSet<D>,
    ) -> RepositoryResult<BTreeMap<String, PidAssignment>> {
        let mut assignments = BTreeMap::new();
        for (name, doc) in documents {
            match ReconcileRequest::for_document(doc) {
                Some(request) => {
                    let assignment = self.reconcile(&request)?;
                    assignments.insert(name.clone(), assignment);
                }
                None => {
                    warn!(name = %name, "文献缺少短标识,跳过标识调和");
                }
            }
        }
        info!(
            total = documents.len(),
            assigned = assignments.len(),
            "批量标识调和完成"
        );
        Ok(assignments)
    }
}
