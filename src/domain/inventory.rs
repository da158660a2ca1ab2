// ==========================================
// 制造运营管理系统 - 库存领域模型
// ==========================================
// 覆盖: 库存物料 / 供应商 / 库存流水 / 库存指标
// ==========================================

use crate::domain::types::{MovementType, StockStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryItem - 库存物料
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub part_number: String,       // 物料编号 (唯一)
    pub name: String,              // 物料名称
    pub category: Option<String>,  // 物料类别
    pub unit_cost: f64,            // 单位成本
    pub current_stock: i64,        // 当前库存
    pub minimum_stock: i64,        // 最小库存
    pub maximum_stock: i64,        // 最大库存
    pub reorder_point: i64,        // 再订货点
    pub reorder_quantity: i64,     // 再订货批量
    pub supplier_id: Option<i64>,  // 供应商
    pub location: Option<String>,  // 库位
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// NewInventoryItem - 物料录入
// ==========================================
// id/时间戳由仓储生成
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub part_number: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_cost: f64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
    pub reorder_point: i64,
    pub reorder_quantity: i64,
    pub supplier_id: Option<i64>,
    pub location: Option<String>,
}

// ==========================================
// InventoryFact - 优化用库存快照
// ==========================================
// 用途: 优化引擎每次调用时读取的只读快照, 不被引擎直接修改
// (库存变更只通过流水 API 进行)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryFact {
    pub item_id: i64,
    pub part_number: String,
    pub unit_cost: f64,
    pub current_stock: i64,
    pub reorder_point: i64,
}

// ==========================================
// Supplier - 供应商
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub lead_time_days: i64,       // 交货周期 (天)
    pub is_active: bool,
}

// ==========================================
// StockMovement - 库存流水
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub inventory_item_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reference_number: Option<String>,
    pub reason: Option<String>,
    pub operator: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// StockMetrics - 库存指标
// ==========================================
// 由物料当前库存与近期消耗推导, 不落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMetrics {
    pub status: StockStatus,
    pub days_of_supply: f64,          // 可供天数
    pub avg_daily_consumption: f64,   // 日均消耗
    pub reorder_needed: bool,
    pub urgency_score: f64,           // 紧急度 0-100
}

impl StockMetrics {
    /// 根据库存水平与日均消耗计算指标
    pub fn derive(item: &InventoryItem, avg_daily_consumption: f64) -> Self {
        let days_of_supply = if avg_daily_consumption > 0.0 {
            item.current_stock as f64 / avg_daily_consumption
        } else {
            0.0
        };

        let status = if item.current_stock <= 0 {
            StockStatus::OutOfStock
        } else if item.current_stock <= item.reorder_point {
            StockStatus::LowStock
        } else if item.current_stock >= item.maximum_stock {
            StockStatus::Overstock
        } else {
            StockStatus::Normal
        };

        // 紧急度: 库存相对再订货点越低越紧急
        let urgency_score = if item.current_stock <= item.reorder_point {
            let base = item.reorder_point.max(1) as f64;
            (100.0 - item.current_stock as f64 / base * 100.0).max(0.0)
        } else {
            0.0
        };

        Self {
            status,
            days_of_supply,
            avg_daily_consumption,
            reorder_needed: item.current_stock <= item.reorder_point,
            urgency_score,
        }
    }
}

// ==========================================
// ReorderSuggestion - 补货建议
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub item_id: i64,
    pub part_number: String,
    pub name: String,
    pub current_stock: i64,
    pub reorder_point: i64,
    pub suggested_quantity: i64,
    pub estimated_cost: f64,
    pub urgency_score: f64,
    /// 库存已跌破再订货点 × 低库存阈值, 需要立即补货
    pub critical: bool,
}

// ==========================================
// StockValuation - 库存估值
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockValuation {
    pub total_value: f64,
    pub total_items: i64,          // 库存总件数
    pub unique_parts: usize,       // 物料种类数
    pub calculated_at: DateTime<Utc>,
}
