// ==========================================
// 制造运营管理系统 - 领域层
// ==========================================
// 职责: 实体与类型定义, 不含数据访问与业务流程
// ==========================================

pub mod allocation;
pub mod inventory;
pub mod production;
pub mod types;

pub use allocation::{
    NewAlert, NewOptimizationRun, NewResourceAllocation, OptimizationRun, ResourceAllocation,
    RunHistoryEntry,
};
pub use inventory::{
    InventoryFact, InventoryItem, NewInventoryItem, ReorderSuggestion, StockMetrics,
    StockMovement, StockValuation, Supplier,
};
pub use production::{
    LineEfficiency, NewProductionRecord, ProductionJob, ProductionLine, ProductionLineFact,
    ProductionRecord,
};
