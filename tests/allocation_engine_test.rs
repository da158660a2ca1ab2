// ==========================================
// 库存分配引擎集成测试
// ==========================================
// 职责: 验证分配模型的库存上限/最小需求约束、
//       成功与失败两条落库路径以及历史查询
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::collections::HashMap;
use std::sync::Arc;

use mfg_ops::config::OptimizerSettings;
use mfg_ops::domain::types::{OptimizationType, RunStatus};
use mfg_ops::engine::outcome::{FailureReason, OptimizationPayload};
use mfg_ops::engine::requirements::FixedBomProvider;
use mfg_ops::engine::Optimizer;
use mfg_ops::repository::{
    AlertRepository, AllocationRepository, InventoryRepository, ProductionRepository,
};
use test_helpers::{create_test_db, seed_item, seed_line};

struct Fixture {
    _tmp: tempfile::NamedTempFile,
    inventory: Arc<InventoryRepository>,
    production: Arc<ProductionRepository>,
    allocations: Arc<AllocationRepository>,
    alerts: Arc<AlertRepository>,
}

impl Fixture {
    fn new() -> Self {
        let (_tmp, conn) = create_test_db().unwrap();
        Self {
            _tmp,
            inventory: Arc::new(InventoryRepository::from_connection(conn.clone())),
            production: Arc::new(ProductionRepository::from_connection(conn.clone())),
            allocations: Arc::new(AllocationRepository::from_connection(conn.clone())),
            alerts: Arc::new(AlertRepository::from_connection(conn)),
        }
    }

    fn optimizer(&self, requirements: HashMap<i64, HashMap<i64, i64>>) -> Optimizer {
        Optimizer::new(
            self.inventory.clone(),
            self.production.clone(),
            self.allocations.clone(),
            self.alerts.clone(),
            Box::new(FixedBomProvider::new(requirements)),
            OptimizerSettings::default(),
        )
    }
}

#[test]
fn test_minimum_requirement_drives_allocation() {
    let fx = Fixture::new();
    let item_id = seed_item(&fx.inventory, "PN-3001", 5.0, 100);
    let line_id = seed_line(&fx.production, "总装一线", 120, 0.9);

    let mut reqs = HashMap::new();
    reqs.insert(line_id, HashMap::from([(item_id, 30)]));

    let outcome = fx
        .optimizer(reqs)
        .optimize_inventory_allocation()
        .unwrap();
    assert!(outcome.is_success());

    // 成本为正, 最优解恰好满足最小需求
    match outcome.payload.as_ref().unwrap() {
        OptimizationPayload::Inventory { allocations } => {
            assert_eq!(allocations.len(), 1);
            assert_eq!(allocations[0].item_id, item_id);
            assert_eq!(allocations[0].line_id, line_id);
            assert_eq!(allocations[0].allocated_quantity, 30);
        }
        other => panic!("期望库存分配载荷, 实际 {:?}", other),
    }

    // 目标值 = (1 + 0.1) × 5.0 × 30
    assert!((outcome.objective_value.unwrap() - 165.0).abs() < 1e-6);
    assert!(outcome.execution_time >= 0.0);

    // 分配行已落库
    let rows = fx.allocations.allocations_for_line(line_id, 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].allocated_quantity - 30.0).abs() < 1e-9);
}

#[test]
fn test_allocation_capped_by_stock() {
    let fx = Fixture::new();
    let item_id = seed_item(&fx.inventory, "PN-3002", 2.0, 100);
    let line_a = seed_line(&fx.production, "总装一线", 120, 0.9);
    let line_b = seed_line(&fx.production, "总装二线", 120, 0.9);

    // 两条产线各要 60, 合计 120 > 库存 100 -> 无可行解
    let mut reqs = HashMap::new();
    reqs.insert(line_a, HashMap::from([(item_id, 60)]));
    reqs.insert(line_b, HashMap::from([(item_id, 60)]));

    let outcome = fx
        .optimizer(reqs)
        .optimize_inventory_allocation()
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.reason, Some(FailureReason::NoOptimalSolution));

    // 失败也要留审计记录, 并产生系统告警
    let history = fx
        .allocations
        .history(Some(OptimizationType::Inventory), 1)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, RunStatus::Failed);
    assert!(!fx.alerts.open_alerts().unwrap().is_empty());
}

#[test]
fn test_repeated_solver_failures_raise_single_alert() {
    let fx = Fixture::new();
    let item_id = seed_item(&fx.inventory, "PN-3004", 2.0, 100);
    let line_a = seed_line(&fx.production, "总装一线", 120, 0.9);
    let line_b = seed_line(&fx.production, "总装二线", 120, 0.9);

    let mut reqs = HashMap::new();
    reqs.insert(line_a, HashMap::from([(item_id, 60)]));
    reqs.insert(line_b, HashMap::from([(item_id, 60)]));
    let optimizer = fx.optimizer(reqs);

    // 同一个不可行模型连跑两次, 周期循环下的典型场景
    assert!(!optimizer.optimize_inventory_allocation().unwrap().is_success());
    assert!(!optimizer.optimize_inventory_allocation().unwrap().is_success());

    // 同源未解决告警不重复发布
    assert_eq!(fx.alerts.open_alerts().unwrap().len(), 1);
}

#[test]
fn test_insufficient_data_is_audited() {
    let fx = Fixture::new();
    // 空数据库: 无物料无产线

    let outcome = fx
        .optimizer(HashMap::new())
        .optimize_inventory_allocation()
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.reason, Some(FailureReason::InsufficientData));
    assert!(outcome.run_id.is_some());

    let history = fx.allocations.history(None, 1).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, RunStatus::Failed);
    assert_eq!(history[0].optimization_type, OptimizationType::Inventory);
}

#[test]
fn test_history_type_filter() {
    let fx = Fixture::new();
    let item_id = seed_item(&fx.inventory, "PN-3003", 1.0, 200);
    let line_id = seed_line(&fx.production, "总装一线", 120, 0.9);

    let mut reqs = HashMap::new();
    reqs.insert(line_id, HashMap::from([(item_id, 10)]));
    let optimizer = fx.optimizer(reqs);

    optimizer.optimize_inventory_allocation().unwrap();
    // 排程无任务 -> FAILED 的 PRODUCTION 记录
    optimizer.optimize_production_schedule().unwrap();

    let all = optimizer.optimization_history(None, 1).unwrap();
    assert_eq!(all.len(), 2);

    let inventory_only = optimizer
        .optimization_history(Some(OptimizationType::Inventory), 1)
        .unwrap();
    assert_eq!(inventory_only.len(), 1);
    assert_eq!(inventory_only[0].status, RunStatus::Completed);
    assert_eq!(inventory_only[0].results_summary, "库存分配: 1 条分配");
}
