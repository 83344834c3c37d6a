// ==========================================
// 文献批次注册系统 - 配置层
// ==========================================
// 职责: 注册流程配置,JSON 局部覆写
// ==========================================

pub mod registry_config;

// 重导出核心配置
pub use registry_config::RegistryConfig;
