// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化与常用测试数据生成
// ==========================================

#![allow(dead_code)]

use mfg_ops::db::{configure_sqlite_connection, init_schema};
use mfg_ops::domain::inventory::NewInventoryItem;
use mfg_ops::repository::{InventoryRepository, ProductionRepository};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 共享连接句柄
pub fn create_test_db() -> Result<(NamedTempFile, Arc<Mutex<Connection>>), Box<dyn Error>> {
    mfg_ops::logging::init_test();
    let temp_file = NamedTempFile::new()?;
    let conn = Connection::open(temp_file.path())?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok((temp_file, Arc::new(Mutex::new(conn))))
}

/// 测试物料模板
pub fn test_item(part_number: &str, unit_cost: f64, current_stock: i64) -> NewInventoryItem {
    NewInventoryItem {
        part_number: part_number.to_string(),
        name: format!("测试物料 {}", part_number),
        category: Some("测试".to_string()),
        unit_cost,
        current_stock,
        minimum_stock: 10,
        maximum_stock: 1000,
        reorder_point: 50,
        reorder_quantity: 100,
        supplier_id: None,
        location: Some("T-01".to_string()),
    }
}

/// 插入一个库存物料并返回 id
pub fn seed_item(
    repo: &InventoryRepository,
    part_number: &str,
    unit_cost: f64,
    current_stock: i64,
) -> i64 {
    repo.insert_item(&test_item(part_number, unit_cost, current_stock))
        .expect("插入测试物料失败")
}

/// 插入一条产线并返回 id
pub fn seed_line(
    repo: &ProductionRepository,
    name: &str,
    capacity_per_hour: i64,
    efficiency_target: f64,
) -> i64 {
    repo.insert_line(name, capacity_per_hour, efficiency_target, 25.0)
        .expect("插入测试产线失败")
}
