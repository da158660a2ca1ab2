// ==========================================
// 制造运营管理系统 - 报表
// ==========================================
// 职责: 库存 / 生产 / 优化三类文本摘要, 供 CLI 输出
// 口径: 汇总计算与仓储查询一致, 报表本身不落库
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::domain::types::{RunStatus, StockStatus};
use crate::repository::error::RepositoryResult;
use crate::repository::{AllocationRepository, InventoryRepository, ProductionRepository};

/// 生产报表默认回溯窗口
const PRODUCTION_WINDOW_DAYS: i64 = 7;
/// 优化报表默认回溯窗口
const OPTIMIZATION_WINDOW_DAYS: i64 = 30;
/// 单次求解超过该时长时在报表中给出提示（秒）
const SLOW_RUN_SECONDS: f64 = 60.0;
/// 成功率低于该值时在报表中给出提示（百分比）
const LOW_SUCCESS_RATE: f64 = 90.0;

// ==========================================
// 报表 DTO
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub total_value: f64,
    pub total_items: i64,
    pub unique_parts: usize,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub rows: Vec<InventoryReportRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReportRow {
    pub part_number: String,
    pub name: String,
    pub current_stock: i64,
    pub reorder_point: i64,
    pub total_value: f64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionReport {
    pub generated_at: DateTime<Utc>,
    pub window_days: i64,
    pub total_planned: i64,
    pub total_actual: i64,
    pub total_defective: i64,
    pub total_downtime_minutes: i64,
    pub overall_efficiency: f64,      // Σactual/Σplanned × 100
    pub quality_rate: f64,            // (Σactual-Σdefective)/Σactual × 100
    pub lines: Vec<LinePerformanceRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinePerformanceRow {
    pub line_name: String,
    pub planned: i64,
    pub actual: i64,
    pub defective: i64,
    pub efficiency: f64,
    pub target_efficiency: f64,
    pub efficiency_variance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub generated_at: DateTime<Utc>,
    pub period_days: i64,
    pub total_runs: usize,
    pub successful_runs: usize,
    pub success_rate: f64,
    pub avg_execution_time: f64,
    pub avg_objective_value: f64,
    pub notes: Vec<String>,
}

// ==========================================
// ReportService - 报表生成
// ==========================================

pub struct ReportService {
    inventory: Arc<InventoryRepository>,
    production: Arc<ProductionRepository>,
    allocations: Arc<AllocationRepository>,
}

impl ReportService {
    pub fn new(
        inventory: Arc<InventoryRepository>,
        production: Arc<ProductionRepository>,
        allocations: Arc<AllocationRepository>,
    ) -> Self {
        Self {
            inventory,
            production,
            allocations,
        }
    }

    /// 库存状态摘要（启用物料）
    pub fn inventory_report(&self) -> RepositoryResult<InventoryReport> {
        let items = self.inventory.find_active_items()?;
        let valuation = self.inventory.valuation()?;

        let mut rows = Vec::with_capacity(items.len());
        let mut low_stock_count = 0;
        let mut out_of_stock_count = 0;
        for item in &items {
            let status = if item.current_stock <= 0 {
                out_of_stock_count += 1;
                StockStatus::OutOfStock
            } else if item.current_stock <= item.reorder_point {
                low_stock_count += 1;
                StockStatus::LowStock
            } else if item.current_stock >= item.maximum_stock {
                StockStatus::Overstock
            } else {
                StockStatus::Normal
            };
            rows.push(InventoryReportRow {
                part_number: item.part_number.clone(),
                name: item.name.clone(),
                current_stock: item.current_stock,
                reorder_point: item.reorder_point,
                total_value: item.current_stock as f64 * item.unit_cost,
                status,
            });
        }

        Ok(InventoryReport {
            generated_at: Utc::now(),
            total_value: valuation.total_value,
            total_items: valuation.total_items,
            unique_parts: valuation.unique_parts,
            low_stock_count,
            out_of_stock_count,
            rows,
        })
    }

    /// 生产绩效摘要（近 N 天, 默认 7 天）
    pub fn production_report(&self, days: Option<i64>) -> RepositoryResult<ProductionReport> {
        let window_days = days.unwrap_or(PRODUCTION_WINDOW_DAYS);
        let lines = self.production.find_active_lines()?;

        let mut line_rows = Vec::with_capacity(lines.len());
        let mut total_planned = 0;
        let mut total_actual = 0;
        let mut total_defective = 0;
        let mut total_downtime = 0;

        for line in &lines {
            let records = self.production.records_since(line.id, window_days)?;
            let planned: i64 = records.iter().map(|r| r.planned_quantity).sum();
            let actual: i64 = records.iter().map(|r| r.actual_quantity).sum();
            let defective: i64 = records.iter().map(|r| r.defective_quantity).sum();
            let downtime: i64 = records.iter().map(|r| r.downtime_minutes).sum();

            total_planned += planned;
            total_actual += actual;
            total_defective += defective;
            total_downtime += downtime;

            let efficiency = if planned > 0 {
                actual as f64 / planned as f64 * 100.0
            } else {
                0.0
            };
            let target = line.efficiency_target * 100.0;
            line_rows.push(LinePerformanceRow {
                line_name: line.name.clone(),
                planned,
                actual,
                defective,
                efficiency,
                target_efficiency: target,
                efficiency_variance: efficiency - target,
            });
        }

        let overall_efficiency = if total_planned > 0 {
            total_actual as f64 / total_planned as f64 * 100.0
        } else {
            0.0
        };
        let quality_rate = if total_actual > 0 {
            (total_actual - total_defective) as f64 / total_actual as f64 * 100.0
        } else {
            0.0
        };

        Ok(ProductionReport {
            generated_at: Utc::now(),
            window_days,
            total_planned,
            total_actual,
            total_defective,
            total_downtime_minutes: total_downtime,
            overall_efficiency,
            quality_rate,
            lines: line_rows,
        })
    }

    /// 优化运行摘要（近 N 天, 默认 30 天）
    pub fn optimization_report(&self, days: Option<i64>) -> RepositoryResult<OptimizationReport> {
        let period_days = days.unwrap_or(OPTIMIZATION_WINDOW_DAYS);
        let entries = self.allocations.history(None, period_days)?;

        let total_runs = entries.len();
        let successful: Vec<_> = entries
            .iter()
            .filter(|e| e.status == RunStatus::Completed)
            .collect();
        let successful_runs = successful.len();

        let success_rate = if total_runs > 0 {
            successful_runs as f64 / total_runs as f64 * 100.0
        } else {
            0.0
        };
        let avg_execution_time = if total_runs > 0 {
            entries.iter().map(|e| e.execution_time_seconds).sum::<f64>() / total_runs as f64
        } else {
            0.0
        };
        let avg_objective_value = if successful_runs > 0 {
            successful.iter().map(|e| e.objective_value).sum::<f64>() / successful_runs as f64
        } else {
            0.0
        };

        let mut notes = Vec::new();
        if total_runs == 0 {
            notes.push("回溯期内没有优化运行记录".to_string());
        } else {
            if avg_execution_time > SLOW_RUN_SECONDS {
                notes.push("平均求解时长偏高, 建议收紧求解参数或缩小规模".to_string());
            }
            if success_rate < LOW_SUCCESS_RATE {
                notes.push("优化成功率偏低, 建议排查失败运行的 failure_reason".to_string());
            }
        }

        Ok(OptimizationReport {
            generated_at: Utc::now(),
            period_days,
            total_runs,
            successful_runs,
            success_rate,
            avg_execution_time,
            avg_objective_value,
            notes,
        })
    }
}

// ==========================================
// 文本渲染
// ==========================================

pub fn render_inventory_report(report: &InventoryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "===== 库存状态摘要 =====");
    let _ = writeln!(out, "生成时间: {}", report.generated_at.to_rfc3339());
    let _ = writeln!(out, "库存总值: {:.2}", report.total_value);
    let _ = writeln!(
        out,
        "物料种类: {}  总件数: {}  低库存: {}  缺货: {}",
        report.unique_parts, report.total_items, report.low_stock_count, report.out_of_stock_count
    );
    let _ = writeln!(out, "{:-<72}", "");
    let _ = writeln!(
        out,
        "{:<14} {:<20} {:>8} {:>8} {:>12} {:<12}",
        "编号", "名称", "库存", "订货点", "价值", "状态"
    );
    for row in &report.rows {
        let _ = writeln!(
            out,
            "{:<14} {:<20} {:>8} {:>8} {:>12.2} {:<12}",
            row.part_number,
            row.name,
            row.current_stock,
            row.reorder_point,
            row.total_value,
            row.status.as_str()
        );
    }
    out
}

pub fn render_production_report(report: &ProductionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "===== 生产绩效摘要 (近{}天) =====", report.window_days);
    let _ = writeln!(
        out,
        "计划: {}  实产: {}  不良: {}  停机: {}分钟",
        report.total_planned, report.total_actual, report.total_defective,
        report.total_downtime_minutes
    );
    let _ = writeln!(
        out,
        "综合效率: {:.2}%  质量合格率: {:.2}%",
        report.overall_efficiency, report.quality_rate
    );
    let _ = writeln!(out, "{:-<72}", "");
    for line in &report.lines {
        let _ = writeln!(
            out,
            "{:<16} 效率 {:>7.2}% / 目标 {:>6.2}% (偏差 {:+.2}%)  实产 {}",
            line.line_name,
            line.efficiency,
            line.target_efficiency,
            line.efficiency_variance,
            line.actual
        );
    }
    out
}

pub fn render_optimization_report(report: &OptimizationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "===== 优化运行摘要 (近{}天) =====", report.period_days);
    let _ = writeln!(
        out,
        "运行次数: {}  成功: {}  成功率: {:.2}%",
        report.total_runs, report.successful_runs, report.success_rate
    );
    let _ = writeln!(
        out,
        "平均求解时长: {:.2}s  平均目标值: {:.2}",
        report.avg_execution_time, report.avg_objective_value
    );
    for note in &report.notes {
        let _ = writeln!(out, "提示: {}", note);
    }
    out
}
