// ==========================================
// 文献批次注册系统 - 注册配置
// ==========================================
// 职责: 相似度阈值、运行模式、数据库超时的集中配置
// 说明: 字段均有默认值,JSON 局部覆写即可生效
// ==========================================

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use crate::domain::types::RunMode;
use crate::engine::similarity::DEFAULT_SIMILARITY_THRESHOLD;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// 注册流程配置（持久化对象）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// 标题/作者相似度阈值（0.0 ~ 1.0）
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// 默认运行模式（REGISTRATION / PREVIEW）
    #[serde(default)]
    pub run_mode: RunMode,

    /// SQLite busy timeout（毫秒）
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// 批次必填字段标签（空则使用内置清单）
    #[serde(default)]
    pub required_labels: Vec<String>,
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            run_mode: RunMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
            required_labels: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// 从 JSON 文本加载配置,缺失字段取默认值
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 配置合法性检查
    ///
    /// # 规则
    /// - similarity_threshold ∈ [0.0, 1.0]
    /// - busy_timeout_ms > 0
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            bail!(
                "similarity_threshold 超出范围 [0.0, 1.0]: {}",
                self.similarity_threshold
            );
        }
        if self.busy_timeout_ms == 0 {
            bail!("busy_timeout_ms 必须大于 0");
        }
        Ok(())
    }
}
