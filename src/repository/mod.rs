// ==========================================
// 制造运营管理系统 - 数据仓储层
// ==========================================
// 职责: 数据访问, 不含业务流程编排
// 约定: 所有仓储通过 from_connection 注入共享连接句柄,
//       不允许模块级全局连接
// ==========================================

pub mod alert_repo;
pub mod allocation_repo;
pub mod error;
pub mod inventory_repo;
pub mod production_repo;

pub use alert_repo::{AlertRepository, AlertView};
pub use allocation_repo::AllocationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::InventoryRepository;
pub use production_repo::ProductionRepository;
