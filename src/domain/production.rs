// ==========================================
// 制造运营管理系统 - 生产领域模型
// ==========================================
// 覆盖: 产线 / 班次生产记录 / 待排产任务
// ==========================================

use crate::domain::types::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionLine - 产线
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLine {
    pub id: i64,
    pub name: String,
    pub capacity_per_hour: i64,    // 小时产能 (件)
    pub efficiency_target: f64,    // 效率目标 (0-1)
    pub setup_cost: f64,           // 换型成本
    pub is_active: bool,
}

// ==========================================
// ProductionLineFact - 排产用产线快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLineFact {
    pub line_id: i64,
    pub name: String,
    pub capacity_per_hour: i64,
    pub efficiency_target: f64,
    pub setup_cost: f64,
}

// ==========================================
// ProductionRecord - 班次生产记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub id: i64,
    pub production_line_id: i64,
    pub product_id: String,
    pub shift_id: Option<String>,
    pub planned_quantity: i64,
    pub actual_quantity: i64,
    pub defective_quantity: i64,
    pub downtime_minutes: i64,
    pub quality_score: f64,        // 0-100
    pub efficiency: f64,           // actual/planned, 0-1
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewProductionRecord - 生产记录录入
// ==========================================
// 效率字段由仓储在写入时计算, 录入方不提供
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductionRecord {
    pub production_line_id: i64,
    pub product_id: String,
    pub shift_id: Option<String>,
    pub planned_quantity: i64,
    pub actual_quantity: i64,
    pub defective_quantity: i64,
    pub downtime_minutes: i64,
    pub quality_score: f64,
}

impl NewProductionRecord {
    /// 计算本班次效率 (actual/planned, planned 为 0 时记 0)
    pub fn efficiency(&self) -> f64 {
        if self.planned_quantity > 0 {
            self.actual_quantity as f64 / self.planned_quantity as f64
        } else {
            0.0
        }
    }
}

// ==========================================
// ProductionJob - 待排产任务
// ==========================================
// 排产优化的真实任务来源 (production_jobs 表)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionJob {
    pub id: i64,
    pub product_id: String,
    pub quantity: i64,
    pub priority: i64,             // 1=高, 2=低
    pub due_date: Option<DateTime<Utc>>,
    pub status: JobStatus,
}

// ==========================================
// LineEfficiency - 产线近期效率
// ==========================================
// 由近 1 天生产记录聚合, 百分比口径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineEfficiency {
    pub line_id: i64,
    pub line_name: String,
    pub current_efficiency: f64,   // 实际/计划 × 100
    pub target_efficiency: f64,    // 目标 × 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_efficiency() {
        let rec = NewProductionRecord {
            production_line_id: 1,
            product_id: "P-1".to_string(),
            shift_id: Some("A".to_string()),
            planned_quantity: 200,
            actual_quantity: 170,
            defective_quantity: 3,
            downtime_minutes: 15,
            quality_score: 98.0,
        };
        assert!((rec.efficiency() - 0.85).abs() < 1e-9);

        let zero_plan = NewProductionRecord { planned_quantity: 0, ..rec };
        assert_eq!(zero_plan.efficiency(), 0.0);
    }
}
