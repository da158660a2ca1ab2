// ==========================================
// 制造运营管理系统 - 数据校验器
// ==========================================
// 职责: 录入数据的纯校验, 不访问数据库
// 所有校验失败都返回带字段名与原因的 ApiError
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::inventory::NewInventoryItem;
use crate::domain::production::{NewProductionRecord, ProductionJob};
use crate::domain::types::MovementType;

// ==========================================
// 校验常量
// ==========================================

const PART_NUMBER_MIN_LEN: usize = 3;
const PART_NUMBER_MAX_LEN: usize = 20;
const ITEM_NAME_MIN_LEN: usize = 3;
const ITEM_NAME_MAX_LEN: usize = 200;
const CATEGORY_MAX_LEN: usize = 100;
const LINE_NAME_MIN_LEN: usize = 3;
const LINE_NAME_MAX_LEN: usize = 100;
const SUPPLIER_NAME_MIN_LEN: usize = 2;
const SUPPLIER_NAME_MAX_LEN: usize = 200;
const PRODUCT_ID_MAX_LEN: usize = 50;
const SHIFT_ID_MAX_LEN: usize = 20;
const ALERT_TITLE_MAX_LEN: usize = 200;
const ALERT_MESSAGE_MAX_LEN: usize = 1000;

/// 物料编号字符集: 大写字母 / 数字 / 连字符, 长度 3-20
fn is_valid_part_number(part_number: &str) -> bool {
    let len = part_number.chars().count();
    if !(PART_NUMBER_MIN_LEN..=PART_NUMBER_MAX_LEN).contains(&len) {
        return false;
    }
    part_number
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

fn field_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::InvalidInput(format!("字段{}错误: {}", field, message.into()))
}

// ==========================================
// DataValidator - 数据校验器
// ==========================================

/// 数据校验器
///
/// 纯函数集合, 对录入数据做格式与取值范围检查。
/// 库存充足性等依赖当前数据状态的规则在仓储层事务内校验。
pub struct DataValidator;

impl DataValidator {
    /// 校验物料录入数据
    pub fn validate_inventory_item(item: &NewInventoryItem) -> ApiResult<()> {
        if !is_valid_part_number(&item.part_number) {
            return Err(field_error(
                "part_number",
                format!(
                    "格式无效 '{}' (要求: 大写字母/数字/连字符, 长度{}-{})",
                    item.part_number, PART_NUMBER_MIN_LEN, PART_NUMBER_MAX_LEN
                ),
            ));
        }

        let name_len = item.name.chars().count();
        if !(ITEM_NAME_MIN_LEN..=ITEM_NAME_MAX_LEN).contains(&name_len) {
            return Err(field_error(
                "name",
                format!("长度{}超出范围{}-{}", name_len, ITEM_NAME_MIN_LEN, ITEM_NAME_MAX_LEN),
            ));
        }

        if item.unit_cost < 0.0 || !item.unit_cost.is_finite() {
            return Err(field_error("unit_cost", format!("无效取值 {}", item.unit_cost)));
        }

        // 所有库存数量字段非负
        let stock_fields = [
            ("current_stock", item.current_stock),
            ("minimum_stock", item.minimum_stock),
            ("maximum_stock", item.maximum_stock),
            ("reorder_point", item.reorder_point),
            ("reorder_quantity", item.reorder_quantity),
        ];
        for (field, value) in stock_fields {
            if value < 0 {
                return Err(field_error(field, format!("不允许负值 {}", value)));
            }
        }

        if item.maximum_stock > 0 && item.minimum_stock > item.maximum_stock {
            return Err(field_error(
                "minimum_stock",
                format!("最小库存{}不得超过最大库存{}", item.minimum_stock, item.maximum_stock),
            ));
        }

        if let Some(category) = &item.category {
            let len = category.chars().count();
            if len > CATEGORY_MAX_LEN {
                return Err(field_error(
                    "category",
                    format!("长度{}超过上限{}", len, CATEGORY_MAX_LEN),
                ));
            }
        }

        Ok(())
    }

    /// 校验库存流水录入
    ///
    /// IN/OUT 数量必须为正; ADJUSTMENT 语义为"设置为目标值", 目标值非负。
    pub fn validate_stock_movement(quantity: i64, movement_type: MovementType) -> ApiResult<()> {
        match movement_type {
            MovementType::In | MovementType::Out => {
                if quantity <= 0 {
                    return Err(field_error(
                        "quantity",
                        format!("{}流水数量必须为正, 实际{}", movement_type.as_str(), quantity),
                    ));
                }
            }
            MovementType::Adjustment => {
                if quantity < 0 {
                    return Err(field_error(
                        "quantity",
                        format!("盘点调整目标库存不允许负值, 实际{}", quantity),
                    ));
                }
            }
        }
        Ok(())
    }

    /// 校验生产记录录入
    pub fn validate_production_record(record: &NewProductionRecord) -> ApiResult<()> {
        if record.product_id.is_empty() || record.product_id.chars().count() > PRODUCT_ID_MAX_LEN {
            return Err(field_error(
                "product_id",
                format!("无效取值 '{}'", record.product_id),
            ));
        }

        if let Some(shift_id) = &record.shift_id {
            if shift_id.chars().count() > SHIFT_ID_MAX_LEN {
                return Err(field_error("shift_id", format!("无效取值 '{}'", shift_id)));
            }
        }

        let quantity_fields = [
            ("planned_quantity", record.planned_quantity),
            ("actual_quantity", record.actual_quantity),
            ("defective_quantity", record.defective_quantity),
            ("downtime_minutes", record.downtime_minutes),
        ];
        for (field, value) in quantity_fields {
            if value < 0 {
                return Err(field_error(field, format!("不允许负值 {}", value)));
            }
        }

        if record.defective_quantity > record.actual_quantity {
            return Err(field_error(
                "defective_quantity",
                format!(
                    "不良数{}不得超过实产数{}",
                    record.defective_quantity, record.actual_quantity
                ),
            ));
        }

        if !(0.0..=100.0).contains(&record.quality_score) {
            return Err(field_error(
                "quality_score",
                format!("应在0-100范围内, 实际{}", record.quality_score),
            ));
        }

        Ok(())
    }

    /// 校验产线录入
    pub fn validate_production_line(
        name: &str,
        capacity_per_hour: i64,
        efficiency_target: f64,
        setup_cost: f64,
    ) -> ApiResult<()> {
        let name_len = name.chars().count();
        if !(LINE_NAME_MIN_LEN..=LINE_NAME_MAX_LEN).contains(&name_len) {
            return Err(field_error(
                "name",
                format!("长度{}超出范围{}-{}", name_len, LINE_NAME_MIN_LEN, LINE_NAME_MAX_LEN),
            ));
        }

        if capacity_per_hour <= 0 {
            return Err(field_error(
                "capacity_per_hour",
                format!("必须为正, 实际{}", capacity_per_hour),
            ));
        }

        if !(0.0..=1.0).contains(&efficiency_target) {
            return Err(field_error(
                "efficiency_target",
                format!("应在0-1范围内, 实际{}", efficiency_target),
            ));
        }

        if setup_cost < 0.0 || !setup_cost.is_finite() {
            return Err(field_error("setup_cost", format!("无效取值 {}", setup_cost)));
        }

        Ok(())
    }

    /// 校验告警内容（类别与级别是枚举, 无需在此检查）
    pub fn validate_alert(title: &str, message: &str) -> ApiResult<()> {
        if title.is_empty() || title.chars().count() > ALERT_TITLE_MAX_LEN {
            return Err(field_error(
                "title",
                format!("长度应在1-{}范围内", ALERT_TITLE_MAX_LEN),
            ));
        }
        if message.is_empty() || message.chars().count() > ALERT_MESSAGE_MAX_LEN {
            return Err(field_error(
                "message",
                format!("长度应在1-{}范围内", ALERT_MESSAGE_MAX_LEN),
            ));
        }
        Ok(())
    }

    /// 校验供应商录入
    pub fn validate_supplier(name: &str, lead_time_days: i64) -> ApiResult<()> {
        let name_len = name.chars().count();
        if !(SUPPLIER_NAME_MIN_LEN..=SUPPLIER_NAME_MAX_LEN).contains(&name_len) {
            return Err(field_error(
                "name",
                format!(
                    "长度{}超出范围{}-{}",
                    name_len, SUPPLIER_NAME_MIN_LEN, SUPPLIER_NAME_MAX_LEN
                ),
            ));
        }

        if lead_time_days < 0 {
            return Err(field_error(
                "lead_time_days",
                format!("不允许负值 {}", lead_time_days),
            ));
        }

        Ok(())
    }

    /// 校验待排产任务录入
    pub fn validate_production_job(job: &ProductionJob) -> ApiResult<()> {
        if job.product_id.is_empty() || job.product_id.chars().count() > PRODUCT_ID_MAX_LEN {
            return Err(field_error("product_id", format!("无效取值 '{}'", job.product_id)));
        }

        if job.quantity <= 0 {
            return Err(field_error("quantity", format!("必须为正, 实际{}", job.quantity)));
        }

        // 优先级口径: 1=高, 2=低
        if !(1..=2).contains(&job.priority) {
            return Err(field_error("priority", format!("应为1或2, 实际{}", job.priority)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> NewInventoryItem {
        NewInventoryItem {
            part_number: "PN-1001".to_string(),
            name: "座椅骨架".to_string(),
            category: Some("结构件".to_string()),
            unit_cost: 12.5,
            current_stock: 100,
            minimum_stock: 10,
            maximum_stock: 500,
            reorder_point: 40,
            reorder_quantity: 120,
            supplier_id: None,
            location: Some("A-01".to_string()),
        }
    }

    #[test]
    fn test_part_number_format() {
        assert!(DataValidator::validate_inventory_item(&sample_item()).is_ok());

        let mut bad = sample_item();
        bad.part_number = "pn-1001".to_string(); // 小写
        assert!(DataValidator::validate_inventory_item(&bad).is_err());

        bad.part_number = "PN".to_string(); // 太短
        assert!(DataValidator::validate_inventory_item(&bad).is_err());

        bad.part_number = "PN_1001".to_string(); // 非法字符
        assert!(DataValidator::validate_inventory_item(&bad).is_err());
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut bad = sample_item();
        bad.reorder_point = -1;
        assert!(DataValidator::validate_inventory_item(&bad).is_err());

        bad = sample_item();
        bad.unit_cost = -0.01;
        assert!(DataValidator::validate_inventory_item(&bad).is_err());
    }

    #[test]
    fn test_stock_movement_sign_rules() {
        assert!(DataValidator::validate_stock_movement(10, MovementType::In).is_ok());
        assert!(DataValidator::validate_stock_movement(0, MovementType::In).is_err());
        assert!(DataValidator::validate_stock_movement(-5, MovementType::Out).is_err());
        // 盘点调整允许设置为 0
        assert!(DataValidator::validate_stock_movement(0, MovementType::Adjustment).is_ok());
        assert!(DataValidator::validate_stock_movement(-1, MovementType::Adjustment).is_err());
    }

    #[test]
    fn test_production_record_rules() {
        let mut rec = NewProductionRecord {
            production_line_id: 1,
            product_id: "P-100".to_string(),
            shift_id: Some("A".to_string()),
            planned_quantity: 200,
            actual_quantity: 180,
            defective_quantity: 5,
            downtime_minutes: 10,
            quality_score: 97.5,
        };
        assert!(DataValidator::validate_production_record(&rec).is_ok());

        rec.defective_quantity = 181; // 超过实产
        assert!(DataValidator::validate_production_record(&rec).is_err());

        rec.defective_quantity = 5;
        rec.quality_score = 100.5;
        assert!(DataValidator::validate_production_record(&rec).is_err());
    }

    #[test]
    fn test_alert_content_rules() {
        assert!(DataValidator::validate_alert("低库存告警", "库存已低于再订货点").is_ok());
        assert!(DataValidator::validate_alert("", "内容").is_err());
        assert!(DataValidator::validate_alert("标题", &"长".repeat(1001)).is_err());
    }

    #[test]
    fn test_supplier_rules() {
        assert!(DataValidator::validate_supplier("华东座椅供应", 7).is_ok());
        assert!(DataValidator::validate_supplier("甲", 7).is_err());
        assert!(DataValidator::validate_supplier("华东座椅供应", -1).is_err());
    }

    #[test]
    fn test_production_line_rules() {
        assert!(DataValidator::validate_production_line("总装一线", 120, 0.9, 50.0).is_ok());
        assert!(DataValidator::validate_production_line("线", 120, 0.9, 50.0).is_err());
        assert!(DataValidator::validate_production_line("总装一线", 0, 0.9, 50.0).is_err());
        assert!(DataValidator::validate_production_line("总装一线", 120, 1.2, 50.0).is_err());
    }
}
