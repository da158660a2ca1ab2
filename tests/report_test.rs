// ==========================================
// 报表集成测试
// ==========================================
// 职责: 验证三类文本摘要的汇总口径
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;

use mfg_ops::domain::production::NewProductionRecord;
use mfg_ops::domain::types::StockStatus;
use mfg_ops::report::{render_inventory_report, ReportService};
use mfg_ops::repository::{AllocationRepository, InventoryRepository, ProductionRepository};
use test_helpers::{create_test_db, seed_item, seed_line};

fn build_service() -> (
    tempfile::NamedTempFile,
    Arc<InventoryRepository>,
    Arc<ProductionRepository>,
    ReportService,
) {
    let (tmp, conn) = create_test_db().unwrap();
    let inventory = Arc::new(InventoryRepository::from_connection(conn.clone()));
    let production = Arc::new(ProductionRepository::from_connection(conn.clone()));
    let allocations = Arc::new(AllocationRepository::from_connection(conn));
    let service = ReportService::new(inventory.clone(), production.clone(), allocations);
    (tmp, inventory, production, service)
}

#[test]
fn test_inventory_report_totals_and_status() {
    let (_tmp, inventory, _production, service) = build_service();
    seed_item(&inventory, "PN-5001", 10.0, 200); // 正常
    seed_item(&inventory, "PN-5002", 5.0, 30); // 低库存 (订货点 50)
    seed_item(&inventory, "PN-5003", 2.0, 0); // 缺货

    let report = service.inventory_report().unwrap();
    assert_eq!(report.unique_parts, 3);
    assert_eq!(report.total_items, 230);
    assert!((report.total_value - 2150.0).abs() < 1e-9);
    assert_eq!(report.low_stock_count, 1);
    assert_eq!(report.out_of_stock_count, 1);

    let by_part = |pn: &str| {
        report
            .rows
            .iter()
            .find(|r| r.part_number == pn)
            .unwrap()
            .status
    };
    assert_eq!(by_part("PN-5001"), StockStatus::Normal);
    assert_eq!(by_part("PN-5002"), StockStatus::LowStock);
    assert_eq!(by_part("PN-5003"), StockStatus::OutOfStock);

    let text = render_inventory_report(&report);
    assert!(text.contains("库存状态摘要"));
    assert!(text.contains("PN-5002"));
}

#[test]
fn test_production_report_efficiency_and_quality() {
    let (_tmp, _inventory, production, service) = build_service();
    let line_id = seed_line(&production, "总装一线", 120, 0.9);
    production
        .insert_record(&NewProductionRecord {
            production_line_id: line_id,
            product_id: "P-1".to_string(),
            shift_id: Some("A".to_string()),
            planned_quantity: 200,
            actual_quantity: 160,
            defective_quantity: 8,
            downtime_minutes: 30,
            quality_score: 95.0,
        })
        .unwrap();

    let report = service.production_report(None).unwrap();
    assert_eq!(report.window_days, 7);
    assert_eq!(report.total_planned, 200);
    assert_eq!(report.total_actual, 160);
    assert!((report.overall_efficiency - 80.0).abs() < 1e-9);
    assert!((report.quality_rate - 95.0).abs() < 1e-9);

    assert_eq!(report.lines.len(), 1);
    let line = &report.lines[0];
    assert!((line.efficiency - 80.0).abs() < 1e-9);
    assert!((line.efficiency_variance - (-10.0)).abs() < 1e-9);
}

#[test]
fn test_optimization_report_empty_history_note() {
    let (_tmp, _inventory, _production, service) = build_service();

    let report = service.optimization_report(None).unwrap();
    assert_eq!(report.total_runs, 0);
    assert!((report.success_rate - 0.0).abs() < 1e-9);
    assert_eq!(report.notes.len(), 1);
    assert!(report.notes[0].contains("没有优化运行记录"));
}
