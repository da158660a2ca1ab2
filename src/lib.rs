// ==========================================
// 制造运营管理系统 - 核心库
// ==========================================
// 系统定位: 决策支持系统 (人工最终控制权)
// 技术栈: Rust + SQLite + 整数规划求解
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 优化与分析
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 报表层 - 文本摘要
pub mod report;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertSeverity, AlertType, AllocationStatus, JobStatus, MovementType, OptimizationType,
    ResourceType, RunStatus, StockStatus,
};

// 领域实体
pub use domain::{
    InventoryItem, LineEfficiency, NewInventoryItem, NewProductionRecord, ProductionJob,
    ProductionLine, ProductionRecord, ReorderSuggestion, StockMetrics, StockMovement,
    StockValuation, Supplier,
};

// 引擎
pub use engine::{
    BomProvider, FixedBomProvider, OptimizationPayload, OptimizeOutcome, Optimizer,
    PeriodicOptimizer, TableBomProvider,
};

// API
pub use api::{AlertApi, ApiError, ApiResult, InventoryApi, OptimizationApi, ProductionApi};

// 报表
pub use report::ReportService;

// ==========================================
// 系统常量
// ==========================================

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "制造运营管理系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_present() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
