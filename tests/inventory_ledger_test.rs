// ==========================================
// 库存流水集成测试
// ==========================================
// 职责: 验证流水驱动的库存变更、负库存保护、
//       低库存告警去重与流水历史顺序
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use mfg_ops::domain::types::MovementType;
use mfg_ops::repository::{AlertRepository, InventoryRepository, RepositoryError};
use test_helpers::{create_test_db, seed_item};

#[test]
fn test_in_out_adjustment_semantics() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repo = InventoryRepository::from_connection(conn);
    let item_id = seed_item(&repo, "PN-1001", 5.0, 100);

    // IN: 累加
    let (old, new) = repo
        .update_stock(item_id, 40, MovementType::In, None, None, Some("测试员"))
        .unwrap();
    assert_eq!((old, new), (100, 140));

    // OUT: 扣减
    let (old, new) = repo
        .update_stock(item_id, 60, MovementType::Out, None, None, None)
        .unwrap();
    assert_eq!((old, new), (140, 80));

    // ADJUSTMENT: 设置为目标值, 流水记录差值
    let (old, new) = repo
        .update_stock(item_id, 75, MovementType::Adjustment, None, Some("盘点"), None)
        .unwrap();
    assert_eq!((old, new), (80, 75));

    let movements = repo.movement_history(Some(item_id), 10).unwrap();
    assert_eq!(movements.len(), 3);
    // 新 -> 旧
    assert_eq!(movements[0].movement_type, MovementType::Adjustment);
    assert_eq!(movements[0].quantity, -5);
    assert_eq!(movements[1].movement_type, MovementType::Out);
    assert_eq!(movements[2].movement_type, MovementType::In);

    // 不过滤物料的全量流水
    assert_eq!(repo.movement_history(None, 10).unwrap().len(), 3);
    assert_eq!(repo.movement_history(None, 2).unwrap().len(), 2);
}

#[test]
fn test_out_below_zero_rejected() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repo = InventoryRepository::from_connection(conn);
    let item_id = seed_item(&repo, "PN-1002", 5.0, 30);

    let err = repo
        .update_stock(item_id, 31, MovementType::Out, None, None, None)
        .unwrap_err();
    match err {
        RepositoryError::InsufficientStock {
            item_id: id,
            current,
            requested,
        } => {
            assert_eq!(id, item_id);
            assert_eq!(current, 30);
            assert_eq!(requested, 31);
        }
        other => panic!("期望 InsufficientStock, 实际 {:?}", other),
    }

    // 拒绝后库存与流水都不变
    let item = repo.find_by_id(item_id).unwrap().unwrap();
    assert_eq!(item.current_stock, 30);
    assert!(repo.movement_history(Some(item_id), 10).unwrap().is_empty());
}

#[test]
fn test_unknown_item_rejected() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repo = InventoryRepository::from_connection(conn);

    let err = repo
        .update_stock(999, 10, MovementType::In, None, None, None)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_low_stock_alert_dedup() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repo = InventoryRepository::from_connection(conn.clone());
    let alerts = AlertRepository::from_connection(conn);

    // reorder_point = 50 (模板默认)
    let item_id = seed_item(&repo, "PN-1003", 5.0, 60);

    // 降到订货点以下 -> 触发一条告警
    repo.update_stock(item_id, 20, MovementType::Out, None, None, None)
        .unwrap();
    assert_eq!(alerts.open_alerts().unwrap().len(), 1);

    // 继续下降 -> 同源未解决告警不重复
    repo.update_stock(item_id, 10, MovementType::Out, None, None, None)
        .unwrap();
    let open = alerts.open_alerts().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].alert_type, "LOW_STOCK");
    assert_eq!(open[0].severity, "MEDIUM");

    // 解决后再次触发 -> 新告警, 库存归零时级别为 HIGH
    alerts.resolve(open[0].id).unwrap();
    repo.update_stock(item_id, 30, MovementType::Out, None, None, None)
        .unwrap();
    let open = alerts.open_alerts().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].severity, "HIGH");
}

#[test]
fn test_duplicate_part_number_rejected() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repo = InventoryRepository::from_connection(conn);

    seed_item(&repo, "PN-1004", 5.0, 10);
    let err = repo
        .insert_item(&test_helpers::test_item("PN-1004", 9.0, 20))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}

#[test]
fn test_valuation_and_low_stock_query() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repo = InventoryRepository::from_connection(conn);

    seed_item(&repo, "PN-2001", 2.0, 100); // 价值 200
    seed_item(&repo, "PN-2002", 10.0, 30); // 价值 300, 低于订货点 50

    let valuation = repo.valuation().unwrap();
    assert_eq!(valuation.unique_parts, 2);
    assert_eq!(valuation.total_items, 130);
    assert!((valuation.total_value - 500.0).abs() < 1e-9);

    let low = repo.low_stock_items().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].part_number, "PN-2002");
}
