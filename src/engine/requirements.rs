// ==========================================
// 制造运营管理系统 - 物料需求估算
// ==========================================
// 职责: 为库存分配优化提供各产线的最小物料需求
// 接缝: BomProvider trait — 物料清单是外部协作方,
//       默认实现基于 bill_of_materials 表 × 近期产量
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::production_repo::ProductionRepository;
use std::collections::HashMap;
use std::sync::Arc;

/// 物料需求来源
///
/// 返回产线当前的最小物料需求 (item_id -> 最小数量)。
/// 空表返回空 map, 对应产线不产生下界约束。
pub trait BomProvider: Send + Sync {
    fn minimum_requirements(&self, line_id: i64) -> RepositoryResult<HashMap<i64, i64>>;
}

// ==========================================
// TableBomProvider - BOM 表驱动的默认实现
// ==========================================
// 最小需求 = qty_per_unit × 产线近 N 天平均实际产量 (向下取整)
pub struct TableBomProvider {
    production: Arc<ProductionRepository>,
    window_days: i64,
}

impl TableBomProvider {
    /// 默认回溯窗口: 7 天
    pub const DEFAULT_WINDOW_DAYS: i64 = 7;

    pub fn new(production: Arc<ProductionRepository>) -> Self {
        Self {
            production,
            window_days: Self::DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_window_days(production: Arc<ProductionRepository>, window_days: i64) -> Self {
        Self {
            production,
            window_days,
        }
    }
}

impl BomProvider for TableBomProvider {
    fn minimum_requirements(&self, line_id: i64) -> RepositoryResult<HashMap<i64, i64>> {
        let avg_production = self
            .production
            .trailing_avg_actual(line_id, self.window_days)?;

        if avg_production <= 0.0 {
            return Ok(HashMap::new());
        }

        let mut requirements = HashMap::new();
        for (item_id, qty_per_unit) in self.production.bom_rows(line_id)? {
            let required = (qty_per_unit * avg_production) as i64;
            if required > 0 {
                requirements.insert(item_id, required);
            }
        }

        Ok(requirements)
    }
}

// ==========================================
// FixedBomProvider - 固定需求 (测试/演示用)
// ==========================================
pub struct FixedBomProvider {
    requirements: HashMap<i64, HashMap<i64, i64>>,
}

impl FixedBomProvider {
    pub fn new(requirements: HashMap<i64, HashMap<i64, i64>>) -> Self {
        Self { requirements }
    }

    /// 空需求: 不给任何产线下界约束
    pub fn empty() -> Self {
        Self {
            requirements: HashMap::new(),
        }
    }
}

impl BomProvider for FixedBomProvider {
    fn minimum_requirements(&self, line_id: i64) -> RepositoryResult<HashMap<i64, i64>> {
        Ok(self.requirements.get(&line_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::inventory::NewInventoryItem;
    use crate::domain::production::NewProductionRecord;
    use crate::repository::inventory_repo::InventoryRepository;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn test_repos() -> (Arc<ProductionRepository>, Arc<InventoryRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (
            Arc::new(ProductionRepository::from_connection(shared.clone())),
            Arc::new(InventoryRepository::from_connection(shared)),
        )
    }

    // BOM 行受外键约束, 必须指向真实库存条目
    fn seed_item(inventory: &InventoryRepository, part_number: &str) -> i64 {
        inventory
            .insert_item(&NewInventoryItem {
                part_number: part_number.to_string(),
                name: format!("物料 {part_number}"),
                category: None,
                unit_cost: 1.0,
                current_stock: 0,
                minimum_stock: 0,
                maximum_stock: 1000,
                reorder_point: 0,
                reorder_quantity: 0,
                supplier_id: None,
                location: None,
            })
            .unwrap()
    }

    fn record(line_id: i64, actual: i64) -> NewProductionRecord {
        NewProductionRecord {
            production_line_id: line_id,
            product_id: "P-1".to_string(),
            shift_id: None,
            planned_quantity: actual,
            actual_quantity: actual,
            defective_quantity: 0,
            downtime_minutes: 0,
            quality_score: 100.0,
        }
    }

    #[test]
    fn test_requirements_scale_with_trailing_output() {
        let (production, inventory) = test_repos();
        let line_id = production.insert_line("总装一线", 120, 0.9, 25.0).unwrap();
        let steel_id = seed_item(&inventory, "MAT-0001");
        let bolt_id = seed_item(&inventory, "MAT-0002");
        production.insert_record(&record(line_id, 100)).unwrap();
        production.insert_record(&record(line_id, 80)).unwrap();
        production.upsert_bom_row(line_id, steel_id, 0.5).unwrap();
        production.upsert_bom_row(line_id, bolt_id, 0.001).unwrap(); // 取整后为 0, 不产生约束

        // 近 30 天平均实产 90, qty_per_unit 0.5 => 需求 45
        let provider = TableBomProvider::with_window_days(production, 30);
        let reqs = provider.minimum_requirements(line_id).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[&steel_id], 45);
    }

    #[test]
    fn test_no_recent_output_means_no_requirements() {
        let (production, inventory) = test_repos();
        let line_id = production.insert_line("总装一线", 120, 0.9, 25.0).unwrap();
        let steel_id = seed_item(&inventory, "MAT-0001");
        production.upsert_bom_row(line_id, steel_id, 0.5).unwrap();

        let provider = TableBomProvider::new(production);
        assert!(provider.minimum_requirements(line_id).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_provider_lookup() {
        let provider = FixedBomProvider::new(HashMap::from([(1, HashMap::from([(7, 30)]))]));
        assert_eq!(provider.minimum_requirements(1).unwrap()[&7], 30);
        assert!(provider.minimum_requirements(2).unwrap().is_empty());
        assert!(FixedBomProvider::empty().minimum_requirements(1).unwrap().is_empty());
    }
}
