// ==========================================
// 文献批次注册系统 - 持久标识登记仓储
// ==========================================
// 职责: pid_registry 表的查询与计划化写入
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

mod core;


pub use core::{PidRegistryRepository, SqlitePidRegistry};
