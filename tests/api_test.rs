// ==========================================
// 业务 API 集成测试
// ==========================================
// 职责: 验证 API 层的录入校验、供应商维护与补货建议
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;

use mfg_ops::api::{ApiError, InventoryApi, ProductionApi};
use mfg_ops::config::ConfigManager;
use mfg_ops::domain::types::MovementType;
use mfg_ops::repository::{InventoryRepository, ProductionRepository};
use test_helpers::{create_test_db, test_item};

fn build_apis() -> (tempfile::NamedTempFile, InventoryApi, ProductionApi) {
    let (tmp, conn) = create_test_db().unwrap();
    let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());
    let inventory_repo = Arc::new(InventoryRepository::from_connection(conn.clone()));
    let production_repo = Arc::new(ProductionRepository::from_connection(conn));
    (
        tmp,
        InventoryApi::new(inventory_repo, config),
        ProductionApi::new(production_repo),
    )
}

#[test]
fn test_item_validation_blocks_insert() {
    let (_tmp, inventory, _production) = build_apis();

    let mut bad = test_item("pn-1001", 5.0, 100); // 小写编号
    match inventory.create_item(bad.clone()) {
        Err(ApiError::InvalidInput(msg)) => assert!(msg.contains("part_number")),
        other => panic!("期望 InvalidInput, 实际 {:?}", other),
    }

    bad.part_number = "PN-1001".to_string();
    bad.unit_cost = -1.0;
    assert!(inventory.create_item(bad).is_err());

    // 校验失败不应落库
    assert!(inventory.list_items().unwrap().is_empty());
}

#[test]
fn test_stock_movement_validation() {
    let (_tmp, inventory, _production) = build_apis();
    let item_id = inventory.create_item(test_item("PN-2001", 5.0, 100)).unwrap();

    match inventory.update_stock(item_id, 0, MovementType::In, None, None, None) {
        Err(ApiError::InvalidInput(msg)) => assert!(msg.contains("quantity")),
        other => panic!("期望 InvalidInput, 实际 {:?}", other),
    }

    // 盘点调整走目标值语义
    let change = inventory
        .update_stock(item_id, 80, MovementType::Adjustment, None, None, Some("张工"))
        .unwrap();
    assert_eq!(change.old_stock, 100);
    assert_eq!(change.new_stock, 80);
}

#[test]
fn test_supplier_roundtrip() {
    let (_tmp, inventory, _production) = build_apis();

    assert!(inventory.create_supplier("甲", 7).is_err()); // 名称太短
    let id = inventory.create_supplier("华东座椅供应", 14).unwrap();

    let suppliers = inventory.list_suppliers().unwrap();
    assert_eq!(suppliers.len(), 1);
    assert_eq!(suppliers[0].id, id);
    assert_eq!(suppliers[0].lead_time_days, 14);
}

#[test]
fn test_reorder_suggestions_use_safety_factor() {
    let (_tmp, inventory, _production) = build_apis();

    // 订货点 50, 库存 20, 缺口 30; 默认安全系数 1.5 => 45 < 订货批量 100
    let item_id = inventory.create_item(test_item("PN-3001", 5.0, 20)).unwrap();

    let suggestions = inventory.reorder_suggestions().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].item_id, item_id);
    assert_eq!(suggestions[0].suggested_quantity, 100);
    assert!((suggestions[0].estimated_cost - 500.0).abs() < 1e-9);
}

#[test]
fn test_reorder_suggestions_flag_critical_below_threshold() {
    let (_tmp, inventory, _production) = build_apis();

    // 默认低库存阈值 0.2, 订货点 50 => 紧急线 10
    let low_id = inventory.create_item(test_item("PN-3101", 5.0, 20)).unwrap();
    let critical_id = inventory.create_item(test_item("PN-3102", 5.0, 5)).unwrap();

    let suggestions = inventory.reorder_suggestions().unwrap();
    assert_eq!(suggestions.len(), 2);
    let by_id = |id: i64| suggestions.iter().find(|s| s.item_id == id).unwrap();
    assert!(!by_id(low_id).critical);
    assert!(by_id(critical_id).critical);
}

#[test]
fn test_job_priority_validation() {
    let (_tmp, _inventory, production) = build_apis();

    assert!(production.enqueue_job("P-1", 50, 3, None).is_err());
    assert!(production.enqueue_job("P-1", 0, 1, None).is_err());
    let job_id = production.enqueue_job("P-1", 50, 1, None).unwrap();

    let jobs = production.pending_jobs().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, job_id);
}

#[test]
fn test_line_efficiency_window_validation() {
    let (_tmp, _inventory, production) = build_apis();

    assert!(production.line_efficiencies(Some(0)).is_err());
    assert!(production.line_efficiencies(None).unwrap().is_empty());
}
