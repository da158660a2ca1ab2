// ==========================================
// 制造运营管理系统 - 资源利用率分析
// ==========================================
// 纯启发式, 不涉及求解器, 输入确定则输出确定:
// - 产线效率 < 目标 × 0.9 时给出 efficiency_improvement 建议
// - 物料年化周转率 < 4 时给出 inventory_optimization 建议
// ==========================================

use crate::domain::allocation::NewOptimizationRun;
use crate::domain::types::{OptimizationType, RunStatus};
use crate::engine::outcome::{
    FailureReason, ItemTurnover, OptimizationPayload, OptimizeOutcome, Recommendation,
    UtilizationMetrics,
};
use crate::repository::error::RepositoryResult;
use crate::repository::{AllocationRepository, InventoryRepository, ProductionRepository};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// 效率建议触发阈值: 目标效率的 90%
const EFFICIENCY_TRIGGER_RATIO: f64 = 0.9;
/// 周转建议触发阈值: 年化 4 次
const TURNOVER_TRIGGER_RATE: f64 = 4.0;
/// 周转率回溯窗口（天）
const TURNOVER_WINDOW_DAYS: i64 = 30;

// ==========================================
// UtilizationAdvisor - 利用率顾问
// ==========================================
pub struct UtilizationAdvisor {
    inventory: Arc<InventoryRepository>,
    production: Arc<ProductionRepository>,
    allocations: Arc<AllocationRepository>,
}

impl UtilizationAdvisor {
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

    /// 执行一次利用率分析
    ///
    /// objective_value 在此类运行中无意义, 固定记 0。
    pub fn analyze(&self) -> RepositoryResult<OptimizeOutcome> {
        let start = Instant::now();
        tracing::info!("开始资源利用率分析");

        // 产线效率: 近 1 天记录
        let line_efficiencies = self.production.line_efficiencies(1)?;
        // 物料周转: 近 30 天 OUT 流水年化
        let facts = self.inventory.active_facts()?;

        let parameters = json!({
            "efficiency_trigger_ratio": EFFICIENCY_TRIGGER_RATIO,
            "turnover_trigger_rate": TURNOVER_TRIGGER_RATE,
            "line_count": line_efficiencies.len(),
            "item_count": facts.len(),
        });

        if line_efficiencies.is_empty() && facts.is_empty() {
            tracing::warn!("利用率分析无可用数据");
            let execution_time = start.elapsed().as_secs_f64();
            let run = NewOptimizationRun {
                optimization_type: OptimizationType::Resource,
                parameters,
                results: json!({}),
                objective_value: 0.0,
                execution_time_seconds: execution_time,
                status: RunStatus::Failed,
            };
            let run_id = self.allocations.record_run(&run)?;
            return Ok(OptimizeOutcome::failed(
                FailureReason::InsufficientData,
                execution_time,
                Some(run_id),
            ));
        }

        let mut recommendations = Vec::new();

        // 产线效率分析（百分比口径）
        for line in &line_efficiencies {
            if line.current_efficiency < line.target_efficiency * EFFICIENCY_TRIGGER_RATIO {
                recommendations.push(Recommendation::EfficiencyImprovement {
                    line_id: line.line_id,
                    line_name: line.line_name.clone(),
                    current_efficiency: line.current_efficiency,
                    target_efficiency: line.target_efficiency,
                    improvement_potential: line.target_efficiency - line.current_efficiency,
                    recommended_actions: vec![
                        "检查维护计划".to_string(),
                        "优化物料流转".to_string(),
                        "加强操作工培训".to_string(),
                    ],
                });
            }
        }

        // 库存周转分析
        let mut turnovers = Vec::new();
        for fact in &facts {
            let out_total = self
                .inventory
                .out_total_since(fact.item_id, TURNOVER_WINDOW_DAYS)?;
            let annualized_out =
                out_total as f64 / TURNOVER_WINDOW_DAYS as f64 * 365.0;
            let turnover_rate = annualized_out / fact.current_stock.max(1) as f64;

            turnovers.push(ItemTurnover {
                item_id: fact.item_id,
                part_number: fact.part_number.clone(),
                current_stock: fact.current_stock,
                turnover_rate,
            });

            if turnover_rate < TURNOVER_TRIGGER_RATE {
                recommendations.push(Recommendation::InventoryOptimization {
                    item_id: fact.item_id,
                    part_number: fact.part_number.clone(),
                    current_stock: fact.current_stock,
                    turnover_rate,
                    recommended_actions: vec![
                        "降低库存水平".to_string(),
                        "复核再订货点".to_string(),
                        "考虑准时制供货".to_string(),
                    ],
                });
            }
        }

        let payload = OptimizationPayload::Utilization {
            recommendations,
            metrics: UtilizationMetrics {
                lines: line_efficiencies,
                inventory: turnovers,
            },
        };

        let execution_time = start.elapsed().as_secs_f64();
        let run = NewOptimizationRun {
            optimization_type: OptimizationType::Resource,
            parameters,
            results: serde_json::to_value(&payload)?,
            objective_value: 0.0,
            execution_time_seconds: execution_time,
            status: RunStatus::Completed,
        };
        let run_id = self.allocations.record_run(&run)?;

        let count = match &payload {
            OptimizationPayload::Utilization { recommendations, .. } => recommendations.len(),
            _ => 0,
        };
        tracing::info!(run_id = %run_id, count, "资源利用率分析完成");

        Ok(OptimizeOutcome::success(run_id, 0.0, execution_time, payload))
    }
}
