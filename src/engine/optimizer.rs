// ==========================================
// 制造运营管理系统 - 优化引擎门面
// ==========================================
// 职责: 组合三类优化/分析入口与历史查询,
//       供 API 层与周期优化循环共用
// ==========================================

use crate::config::OptimizerSettings;
use crate::domain::allocation::RunHistoryEntry;
use crate::domain::types::OptimizationType;
use crate::engine::allocation::AllocationEngine;
use crate::engine::outcome::OptimizeOutcome;
use crate::engine::requirements::BomProvider;
use crate::engine::schedule::ScheduleEngine;
use crate::engine::utilization::UtilizationAdvisor;
use crate::repository::error::RepositoryResult;
use crate::repository::{
    AlertRepository, AllocationRepository, InventoryRepository, ProductionRepository,
};
use std::sync::Arc;

// ==========================================
// Optimizer - 优化引擎门面
// ==========================================
pub struct Optimizer {
    allocation: AllocationEngine,
    schedule: ScheduleEngine,
    utilization: UtilizationAdvisor,
    allocations: Arc<AllocationRepository>,
    bom: Box<dyn BomProvider>,
}

impl Optimizer {
    pub fn new(
        inventory: Arc<InventoryRepository>,
        production: Arc<ProductionRepository>,
        allocations: Arc<AllocationRepository>,
        alerts: Arc<AlertRepository>,
        bom: Box<dyn BomProvider>,
        settings: OptimizerSettings,
    ) -> Self {
        Self {
            allocation: AllocationEngine::new(
                inventory.clone(),
                production.clone(),
                allocations.clone(),
                alerts.clone(),
                settings.clone(),
            ),
            schedule: ScheduleEngine::new(
                production.clone(),
                allocations.clone(),
                alerts,
                settings,
            ),
            utilization: UtilizationAdvisor::new(inventory, production, allocations.clone()),
            allocations,
            bom,
        }
    }

    /// 库存分配优化（库存 -> 产线）
    pub fn optimize_inventory_allocation(&self) -> RepositoryResult<OptimizeOutcome> {
        self.allocation.optimize(self.bom.as_ref())
    }

    /// 生产排程优化（任务 -> (产线, 时间槽)）
    pub fn optimize_production_schedule(&self) -> RepositoryResult<OptimizeOutcome> {
        self.schedule.optimize()
    }

    /// 资源利用率分析（启发式, 无求解器）
    pub fn optimize_resource_utilization(&self) -> RepositoryResult<OptimizeOutcome> {
        self.utilization.analyze()
    }

    /// 优化历史（新 -> 旧）
    pub fn optimization_history(
        &self,
        optimization_type: Option<OptimizationType>,
        days: i64,
    ) -> RepositoryResult<Vec<RunHistoryEntry>> {
        self.allocations.history(optimization_type, days)
    }
}
