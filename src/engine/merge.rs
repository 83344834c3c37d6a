// ==========================================
// 文献批次注册系统 - 身份合并引擎
// ==========================================
// 职责: 把批次来稿合并进已注册文献集,不产生重复身份
// 输入: 已注册集合 + 批次集合 + 相似度判定器
// 输出: MergeOutcome（合并集 / 接受 / 拒绝 / 冲突 / 历史轨迹）
// 红线: 不修改输入; 冲突是数据不是错误; 每篇来稿恰好一个终态
// ==========================================

mod core;


pub use core::{MergeEngine, MergeOutcome};
