// ==========================================
// 资源利用率分析集成测试
// ==========================================
// 职责: 验证效率/周转两类触发阈值与运行记录
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;

use mfg_ops::domain::production::NewProductionRecord;
use mfg_ops::domain::types::{MovementType, OptimizationType, RunStatus};
use mfg_ops::engine::outcome::{FailureReason, OptimizationPayload, Recommendation};
use mfg_ops::engine::UtilizationAdvisor;
use mfg_ops::repository::{AllocationRepository, InventoryRepository, ProductionRepository};
use test_helpers::{create_test_db, seed_item, seed_line};

struct Fixture {
    _tmp: tempfile::NamedTempFile,
    inventory: Arc<InventoryRepository>,
    production: Arc<ProductionRepository>,
    allocations: Arc<AllocationRepository>,
    advisor: UtilizationAdvisor,
}

impl Fixture {
    fn new() -> Self {
        let (_tmp, conn) = create_test_db().unwrap();
        let inventory = Arc::new(InventoryRepository::from_connection(conn.clone()));
        let production = Arc::new(ProductionRepository::from_connection(conn.clone()));
        let allocations = Arc::new(AllocationRepository::from_connection(conn));
        let advisor = UtilizationAdvisor::new(
            inventory.clone(),
            production.clone(),
            allocations.clone(),
        );
        Self {
            _tmp,
            inventory,
            production,
            allocations,
            advisor,
        }
    }

    fn record(&self, line_id: i64, planned: i64, actual: i64) {
        self.production
            .insert_record(&NewProductionRecord {
                production_line_id: line_id,
                product_id: "P-1".to_string(),
                shift_id: Some("A".to_string()),
                planned_quantity: planned,
                actual_quantity: actual,
                defective_quantity: 0,
                downtime_minutes: 0,
                quality_score: 100.0,
            })
            .unwrap();
    }

    fn recommendations(&self) -> Vec<Recommendation> {
        let outcome = self.advisor.analyze().unwrap();
        assert!(outcome.is_success());
        match outcome.payload.unwrap() {
            OptimizationPayload::Utilization {
                recommendations, ..
            } => recommendations,
            other => panic!("期望利用率载荷, 实际 {:?}", other),
        }
    }
}

#[test]
fn test_low_efficiency_triggers_recommendation() {
    let fx = Fixture::new();
    let line_id = seed_line(&fx.production, "总装一线", 120, 0.9);
    // 效率 50% < 90% × 0.9 = 81%
    fx.record(line_id, 100, 50);

    let recs = fx.recommendations();
    assert_eq!(recs.len(), 1);
    match &recs[0] {
        Recommendation::EfficiencyImprovement {
            line_id: id,
            current_efficiency,
            target_efficiency,
            improvement_potential,
            recommended_actions,
            ..
        } => {
            assert_eq!(*id, line_id);
            assert!((*current_efficiency - 50.0).abs() < 1e-9);
            assert!((*target_efficiency - 90.0).abs() < 1e-9);
            assert!((*improvement_potential - 40.0).abs() < 1e-9);
            assert!(!recommended_actions.is_empty());
        }
        other => panic!("期望效率建议, 实际 {:?}", other),
    }
}

#[test]
fn test_near_target_efficiency_not_flagged() {
    let fx = Fixture::new();
    let line_id = seed_line(&fx.production, "总装一线", 120, 0.9);
    // 效率 85% >= 81% 阈值
    fx.record(line_id, 100, 85);

    assert!(fx.recommendations().is_empty());
}

#[test]
fn test_slow_turnover_triggers_recommendation() {
    let fx = Fixture::new();

    // 滞销物料: 近 30 天无出库, 年化周转率 0 < 4
    let slow_id = seed_item(&fx.inventory, "PN-4001", 5.0, 500);

    // 快周转物料: 出库 900 后剩 100, 年化 900/30×365/100 ≈ 109 > 4
    let fast_id = seed_item(&fx.inventory, "PN-4002", 5.0, 1000);
    fx.inventory
        .update_stock(fast_id, 900, MovementType::Out, None, None, None)
        .unwrap();

    let recs = fx.recommendations();
    assert_eq!(recs.len(), 1);
    match &recs[0] {
        Recommendation::InventoryOptimization {
            item_id,
            turnover_rate,
            ..
        } => {
            assert_eq!(*item_id, slow_id);
            assert_eq!(*turnover_rate, 0.0);
        }
        other => panic!("期望库存建议, 实际 {:?}", other),
    }
}

#[test]
fn test_no_data_is_audited_as_failed() {
    let fx = Fixture::new();

    let outcome = fx.advisor.analyze().unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.reason, Some(FailureReason::InsufficientData));

    let history = fx
        .allocations
        .history(Some(OptimizationType::Resource), 1)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, RunStatus::Failed);
}

#[test]
fn test_completed_run_recorded_with_zero_objective() {
    let fx = Fixture::new();
    let line_id = seed_line(&fx.production, "总装一线", 120, 0.9);
    fx.record(line_id, 100, 95);

    let outcome = fx.advisor.analyze().unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.objective_value, Some(0.0));

    let history = fx
        .allocations
        .history(Some(OptimizationType::Resource), 1)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, RunStatus::Completed);
}
