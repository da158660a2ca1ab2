// ==========================================
// 生产排程引擎集成测试
// ==========================================
// 职责: 验证排程模型的恰好指派/槽占用/产能约束,
//       任务状态翻转与失败路径
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::collections::HashSet;
use std::sync::Arc;

use mfg_ops::config::OptimizerSettings;
use mfg_ops::domain::types::{OptimizationType, RunStatus};
use mfg_ops::engine::outcome::{FailureReason, OptimizationPayload};
use mfg_ops::engine::requirements::FixedBomProvider;
use mfg_ops::engine::Optimizer;
use mfg_ops::repository::{
    AlertRepository, AllocationRepository, InventoryRepository, ProductionRepository,
};
use test_helpers::{create_test_db, seed_line};

fn build_optimizer(
    conn: std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>,
) -> (
    Optimizer,
    Arc<ProductionRepository>,
    Arc<AllocationRepository>,
    Arc<AlertRepository>,
) {
    let inventory = Arc::new(InventoryRepository::from_connection(conn.clone()));
    let production = Arc::new(ProductionRepository::from_connection(conn.clone()));
    let allocations = Arc::new(AllocationRepository::from_connection(conn.clone()));
    let alerts = Arc::new(AlertRepository::from_connection(conn));

    let settings = OptimizerSettings {
        schedule_horizon_slots: 8,
        ..OptimizerSettings::default()
    };
    let optimizer = Optimizer::new(
        inventory,
        production.clone(),
        allocations.clone(),
        alerts.clone(),
        Box::new(FixedBomProvider::empty()),
        settings,
    );
    (optimizer, production, allocations, alerts)
}

#[test]
fn test_each_job_assigned_exactly_once() {
    let (_tmp, conn) = create_test_db().unwrap();
    let (optimizer, production, _allocations, _alerts) = build_optimizer(conn);

    let line_id = seed_line(&production, "总装一线", 100, 0.9);
    let job_a = production.insert_job("P-100", 50, 1, None).unwrap();
    let job_b = production.insert_job("P-200", 40, 2, None).unwrap();

    let outcome = optimizer.optimize_production_schedule().unwrap();
    assert!(outcome.is_success());

    let assignments = match outcome.payload.as_ref().unwrap() {
        OptimizationPayload::Schedule { assignments } => assignments,
        other => panic!("期望排程载荷, 实际 {:?}", other),
    };

    // 每个任务恰好一次
    let job_ids: HashSet<i64> = assignments.iter().map(|a| a.job_id).collect();
    assert_eq!(assignments.len(), 2);
    assert_eq!(job_ids, HashSet::from([job_a, job_b]));

    // 同一 (产线, 槽) 不重复占用
    let occupied: HashSet<(i64, usize)> = assignments
        .iter()
        .map(|a| (a.assigned_line, a.assigned_slot))
        .collect();
    assert_eq!(occupied.len(), assignments.len());

    // 数量不超过产能
    for a in assignments {
        assert_eq!(a.assigned_line, line_id);
        assert!(a.quantity <= 100);
    }

    // 任务状态已翻转, 二次排程视为数据不足
    assert!(production.pending_jobs().unwrap().is_empty());
    let second = optimizer.optimize_production_schedule().unwrap();
    assert_eq!(second.reason, Some(FailureReason::InsufficientData));
}

#[test]
fn test_high_priority_scheduled_earlier() {
    let (_tmp, conn) = create_test_db().unwrap();
    let (optimizer, production, _allocations, _alerts) = build_optimizer(conn);

    seed_line(&production, "总装一线", 100, 0.9);
    let urgent = production.insert_job("P-URGENT", 50, 1, None).unwrap();
    let normal = production.insert_job("P-NORMAL", 50, 2, None).unwrap();

    let outcome = optimizer.optimize_production_schedule().unwrap();
    let assignments = match outcome.payload.as_ref().unwrap() {
        OptimizationPayload::Schedule { assignments } => assignments,
        other => panic!("期望排程载荷, 实际 {:?}", other),
    };

    let slot_of = |job_id: i64| {
        assignments
            .iter()
            .find(|a| a.job_id == job_id)
            .map(|a| a.assigned_slot)
            .unwrap()
    };
    // priority=1 的槽位成本系数更高, 最优解把它排在更早的槽
    assert!(slot_of(urgent) <= slot_of(normal));
}

#[test]
fn test_capacity_violation_is_infeasible() {
    let (_tmp, conn) = create_test_db().unwrap();
    let (optimizer, production, allocations, alerts) = build_optimizer(conn);

    seed_line(&production, "小产能线", 100, 0.9);
    // 单任务数量超过所有槽的产能 -> 恰好指派约束无法满足
    production.insert_job("P-BIG", 200, 1, None).unwrap();

    let outcome = optimizer.optimize_production_schedule().unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.reason, Some(FailureReason::NoOptimalSolution));

    // 审计 + 告警
    let history = allocations
        .history(Some(OptimizationType::Production), 1)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, RunStatus::Failed);
    assert!(!alerts.open_alerts().unwrap().is_empty());

    // 任务保持 PENDING, 等待下一轮
    assert_eq!(production.pending_jobs().unwrap().len(), 1);
}
