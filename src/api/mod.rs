// ==========================================
// 制造运营管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供 CLI 命令调用
// ==========================================

pub mod error;
pub mod alert_api;
pub mod inventory_api;
pub mod optimization_api;
pub mod production_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use alert_api::AlertApi;
pub use inventory_api::{InventoryApi, ItemWithMetrics, StockChange};
pub use optimization_api::OptimizationApi;
pub use production_api::ProductionApi;
pub use validator::DataValidator;
