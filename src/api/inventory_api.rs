// ==========================================
// 制造运营管理系统 - 库存 API
// ==========================================
// 职责: 物料录入与查询 / 流水驱动的库存变更 /
//       低库存与补货建议 / 库存估值
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::DataValidator;
use crate::config::config_manager::ConfigManager;
use crate::domain::inventory::{
    InventoryItem, NewInventoryItem, ReorderSuggestion, StockMetrics, StockMovement,
    StockValuation, Supplier,
};
use crate::domain::types::MovementType;
use crate::repository::inventory_repo::InventoryRepository;

/// 日均消耗的回溯窗口
const CONSUMPTION_WINDOW_DAYS: i64 = 30;
/// 流水历史默认返回条数
const DEFAULT_MOVEMENT_LIMIT: i64 = 100;

// ==========================================
// ItemWithMetrics - 物料 + 库存指标组合
// ==========================================
/// 用于展示的物料完整信息（主数据 + 推导指标）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemWithMetrics {
    pub item: InventoryItem,
    pub metrics: StockMetrics,
}

/// 库存变更结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockChange {
    pub item_id: i64,
    pub old_stock: i64,
    pub new_stock: i64,
}

// ==========================================
// InventoryApi - 库存 API
// ==========================================

/// 库存API
///
/// 职责：
/// 1. 物料录入（含数据校验）与查询
/// 2. 库存变更（IN/OUT/ADJUSTMENT, 全部走流水）
/// 3. 低库存查询与补货建议
/// 4. 库存估值
pub struct InventoryApi {
    inventory_repo: Arc<InventoryRepository>,
    config: Arc<ConfigManager>,
}

impl InventoryApi {
    pub fn new(inventory_repo: Arc<InventoryRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            inventory_repo,
            config,
        }
    }

    // ==========================================
    // 录入接口
    // ==========================================

    /// 新增物料
    ///
    /// # 返回
    /// - Ok(i64): 新物料 id
    /// - Err(ApiError): 校验失败 / part_number 重复
    pub fn create_item(&self, item: NewInventoryItem) -> ApiResult<i64> {
        DataValidator::validate_inventory_item(&item)?;
        let item_id = self.inventory_repo.insert_item(&item)?;
        info!(item_id, part_number = %item.part_number, "物料已创建");
        Ok(item_id)
    }

    /// 库存变更（流水驱动, 库存表不提供直改接口）
    ///
    /// # 语义
    /// - IN: 入库, quantity 为正
    /// - OUT: 出库, quantity 为正, 不允许扣为负库存
    /// - ADJUSTMENT: 盘点调整, quantity 为目标库存
    pub fn update_stock(
        &self,
        item_id: i64,
        quantity: i64,
        movement_type: MovementType,
        reference_number: Option<&str>,
        reason: Option<&str>,
        operator: Option<&str>,
    ) -> ApiResult<StockChange> {
        DataValidator::validate_stock_movement(quantity, movement_type)?;
        let (old_stock, new_stock) = self.inventory_repo.update_stock(
            item_id,
            quantity,
            movement_type,
            reference_number,
            reason,
            operator,
        )?;
        Ok(StockChange {
            item_id,
            old_stock,
            new_stock,
        })
    }

    /// 新增供应商
    pub fn create_supplier(&self, name: &str, lead_time_days: i64) -> ApiResult<i64> {
        DataValidator::validate_supplier(name, lead_time_days)?;
        let supplier_id = self.inventory_repo.insert_supplier(name, lead_time_days)?;
        info!(supplier_id, name, "供应商已创建");
        Ok(supplier_id)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询启用中的供应商
    pub fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.inventory_repo.active_suppliers()?)
    }

    /// 按 id 查询单个物料
    pub fn get_item(&self, item_id: i64) -> ApiResult<InventoryItem> {
        self.inventory_repo
            .find_by_id(item_id)?
            .ok_or_else(|| ApiError::NotFound(format!("InventoryItem(id={})不存在", item_id)))
    }

    /// 查询启用中的物料, 附带推导指标
    pub fn list_items(&self) -> ApiResult<Vec<ItemWithMetrics>> {
        let items = self.inventory_repo.find_active_items()?;

        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let avg = self
                .inventory_repo
                .avg_daily_consumption(item.id, CONSUMPTION_WINDOW_DAYS)?;
            let metrics = StockMetrics::derive(&item, avg);
            result.push(ItemWithMetrics { item, metrics });
        }
        Ok(result)
    }

    /// 低库存物料（current_stock <= reorder_point）
    pub fn low_stock_items(&self) -> ApiResult<Vec<InventoryItem>> {
        Ok(self.inventory_repo.low_stock_items()?)
    }

    /// 补货建议
    ///
    /// 建议批量 = max(reorder_quantity, 缺口 × 安全系数),
    /// 缺口 = reorder_point - current_stock, 安全系数来自配置
    pub fn reorder_suggestions(&self) -> ApiResult<Vec<ReorderSuggestion>> {
        let safety_factor = self
            .config
            .reorder_safety_factor()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;
        // 低库存阈值: 库存跌破 再订货点 × 阈值 时标记为紧急
        let low_stock_threshold = self
            .config
            .low_stock_threshold()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        let mut suggestions = Vec::new();
        for item in self.inventory_repo.low_stock_items()? {
            let shortfall = (item.reorder_point - item.current_stock).max(0);
            let suggested_quantity = item
                .reorder_quantity
                .max((shortfall as f64 * safety_factor).ceil() as i64);

            let avg = self
                .inventory_repo
                .avg_daily_consumption(item.id, CONSUMPTION_WINDOW_DAYS)?;
            let metrics = StockMetrics::derive(&item, avg);

            suggestions.push(ReorderSuggestion {
                item_id: item.id,
                part_number: item.part_number,
                name: item.name,
                current_stock: item.current_stock,
                reorder_point: item.reorder_point,
                suggested_quantity,
                estimated_cost: suggested_quantity as f64 * item.unit_cost,
                urgency_score: metrics.urgency_score,
                critical: (item.current_stock as f64)
                    <= item.reorder_point as f64 * low_stock_threshold,
            });
        }

        // 紧急度降序
        suggestions.sort_by(|a, b| {
            b.urgency_score
                .partial_cmp(&a.urgency_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(suggestions)
    }

    /// 库存流水历史（新 -> 旧）
    pub fn movement_history(
        &self,
        item_id: Option<i64>,
        limit: Option<i64>,
    ) -> ApiResult<Vec<StockMovement>> {
        let limit = limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT);
        if limit <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "limit 必须为正, 实际{}",
                limit
            )));
        }
        Ok(self.inventory_repo.movement_history(item_id, limit)?)
    }

    /// 库存估值（启用物料）
    pub fn valuation(&self) -> ApiResult<StockValuation> {
        Ok(self.inventory_repo.valuation()?)
    }
}
