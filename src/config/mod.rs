// ==========================================
// 制造运营管理系统 - 配置层
// ==========================================

pub mod config_manager;

pub use config_manager::{ConfigManager, OptimizerSettings};
