// ==========================================
// 制造运营管理系统 - 库存分配优化引擎
// ==========================================
// 模型: 整数线性规划 (good_lp)
// 目标: 最小化 Σ (1 + 损耗罚) × 单位成本 × 分配量
// 约束: 1) 每个物料跨产线分配总量 <= 当前库存
//       2) 有最小需求的 (产线, 物料) 分配量 >= 需求
// 决策变量按 物料 × 产线 全叉积声明, 两个维度都在几十量级
// ==========================================

use crate::config::OptimizerSettings;
use crate::domain::allocation::{NewOptimizationRun, NewResourceAllocation};
use crate::domain::types::{
    AlertSeverity, AlertType, AllocationStatus, OptimizationType, ResourceType, RunStatus,
};
use crate::domain::NewAlert;
use crate::engine::outcome::{
    AllocationLine, FailureReason, OptimizationPayload, OptimizeOutcome,
};
use crate::engine::requirements::BomProvider;
use crate::repository::error::RepositoryResult;
use crate::repository::{
    AlertRepository, AllocationRepository, InventoryRepository, ProductionRepository,
};
use chrono::Utc;
use good_lp::{constraint, default_solver, variable, variables, Expression, Solution, SolverModel};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

// ==========================================
// AllocationEngine - 库存分配引擎
// ==========================================
pub struct AllocationEngine {
    inventory: Arc<InventoryRepository>,
    production: Arc<ProductionRepository>,
    allocations: Arc<AllocationRepository>,
    alerts: Arc<AlertRepository>,
    settings: OptimizerSettings,
}

impl AllocationEngine {
    pub fn new(
        inventory: Arc<InventoryRepository>,
        production: Arc<ProductionRepository>,
        allocations: Arc<AllocationRepository>,
        alerts: Arc<AlertRepository>,
        settings: OptimizerSettings,
    ) -> Self {
        Self {
            inventory,
            production,
            allocations,
            alerts,
            settings,
        }
    }

    /// 执行一次库存分配优化
    ///
    /// 每次调用读取新快照, 不做缓存。预期内失败(数据不足/无最优解)
    /// 作为 FAILED 审计记录落库并体现在返回值中, 不抛错;
    /// 持久化失败向上传播。
    pub fn optimize(&self, bom: &dyn BomProvider) -> RepositoryResult<OptimizeOutcome> {
        let start = Instant::now();
        tracing::info!("开始库存分配优化");

        let items = self.inventory.active_facts()?;
        let lines = self.production.active_line_facts()?;

        let parameters = json!({
            "max_time_secs": self.settings.max_optimization_time_secs,
            "waste_penalty": self.settings.waste_penalty,
            "item_count": items.len(),
            "line_count": lines.len(),
        });

        if items.is_empty() || lines.is_empty() {
            tracing::warn!("库存分配优化数据不足, 不调用求解器");
            return self.audit_failure(FailureReason::InsufficientData, parameters, start);
        }

        // 各产线最小物料需求 (外部 BOM 协作方)
        let mut requirements: HashMap<i64, HashMap<i64, i64>> = HashMap::new();
        for line in &lines {
            let reqs = bom.minimum_requirements(line.line_id)?;
            if !reqs.is_empty() {
                requirements.insert(line.line_id, reqs);
            }
        }

        // ===== 建模 =====
        let mut vars = variables!();
        let mut alloc_vars: HashMap<(i64, i64), good_lp::Variable> = HashMap::new();
        for item in &items {
            for line in &lines {
                let var = vars.add(
                    variable()
                        .integer()
                        .min(0)
                        .max(item.current_stock.max(0) as f64),
                );
                alloc_vars.insert((item.item_id, line.line_id), var);
            }
        }

        // 目标: 分配成本 + 损耗罚
        let waste_penalty = self.settings.waste_penalty;
        let mut objective = Expression::from(0.0);
        for item in &items {
            let coeff = (1.0 + waste_penalty) * item.unit_cost;
            for line in &lines {
                objective += coeff * alloc_vars[&(item.item_id, line.line_id)];
            }
        }

        let mut problem = vars.minimise(objective).using(default_solver);

        // 约束 1: 分配总量不超过可用库存
        for item in &items {
            let total = lines.iter().fold(Expression::from(0.0), |acc, line| {
                acc + alloc_vars[&(item.item_id, line.line_id)]
            });
            problem = problem.with(constraint!(total <= item.current_stock as f64));
        }

        // 约束 2: 满足最小生产需求
        for (line_id, reqs) in &requirements {
            for (item_id, min_required) in reqs {
                if let Some(var) = alloc_vars.get(&(*item_id, *line_id)) {
                    problem = problem.with(constraint!(*var >= *min_required as f64));
                }
            }
        }

        // ===== 求解 =====
        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(e) => {
                tracing::warn!(error = %e, "库存分配优化未找到最优解");
                self.raise_solver_alert("库存分配", &e.to_string())?;
                return self.audit_failure(FailureReason::NoOptimalSolution, parameters, start);
            }
        };

        // ===== 结果提取 =====
        let line_names: HashMap<i64, &str> = lines
            .iter()
            .map(|l| (l.line_id, l.name.as_str()))
            .collect();

        let mut allocation_lines = Vec::new();
        let mut new_allocations = Vec::new();
        let mut objective_value = 0.0;
        let now = Utc::now();

        for item in &items {
            for line in &lines {
                let var = alloc_vars[&(item.item_id, line.line_id)];
                let quantity = solution.value(var).round() as i64;
                objective_value += (1.0 + waste_penalty) * item.unit_cost * quantity as f64;

                if quantity > 0 {
                    allocation_lines.push(AllocationLine {
                        item_id: item.item_id,
                        part_number: item.part_number.clone(),
                        line_id: line.line_id,
                        line_name: line_names[&line.line_id].to_string(),
                        allocated_quantity: quantity,
                        unit_cost: item.unit_cost,
                    });
                    new_allocations.push(NewResourceAllocation {
                        production_line_id: line.line_id,
                        resource_type: ResourceType::Material,
                        resource_id: item.item_id.to_string(),
                        allocated_quantity: quantity as f64,
                        allocation_date: now,
                        status: AllocationStatus::Planned,
                    });
                }
            }
        }

        let payload = OptimizationPayload::Inventory {
            allocations: allocation_lines,
        };

        // 墙钟耗时, 含模型构建
        let execution_time = start.elapsed().as_secs_f64();

        let run = NewOptimizationRun {
            optimization_type: OptimizationType::Inventory,
            parameters,
            results: serde_json::to_value(&payload)?,
            objective_value,
            execution_time_seconds: execution_time,
            status: RunStatus::Completed,
        };
        let run_id = self.allocations.apply_inventory_run(&run, &new_allocations)?;

        tracing::info!(
            run_id = %run_id,
            objective_value,
            execution_time,
            "库存分配优化完成"
        );

        Ok(OptimizeOutcome::success(
            run_id,
            objective_value,
            execution_time,
            payload,
        ))
    }

    /// 失败路径审计: FAILED 运行记录, 失败原因写入 parameters
    fn audit_failure(
        &self,
        reason: FailureReason,
        mut parameters: serde_json::Value,
        start: Instant,
    ) -> RepositoryResult<OptimizeOutcome> {
        let execution_time = start.elapsed().as_secs_f64();
        if let Some(obj) = parameters.as_object_mut() {
            obj.insert("failure_reason".to_string(), json!(reason.as_str()));
        }

        let run = NewOptimizationRun {
            optimization_type: OptimizationType::Inventory,
            parameters,
            results: json!({}),
            objective_value: 0.0,
            execution_time_seconds: execution_time,
            status: RunStatus::Failed,
        };
        let run_id = self.allocations.record_run(&run)?;

        Ok(OptimizeOutcome::failed(reason, execution_time, Some(run_id)))
    }

    fn raise_solver_alert(&self, scope: &str, detail: &str) -> RepositoryResult<()> {
        // source_id 固定为优化类别: 同类失败在未解决前不重复发布
        self.alerts.raise(&NewAlert {
            alert_type: AlertType::System,
            severity: AlertSeverity::High,
            title: format!("{}优化求解失败", scope),
            message: format!("求解器未给出最优解: {}", detail),
            source_id: Some(OptimizationType::Inventory.as_str().to_string()),
            source_type: Some("OPTIMIZATION".to_string()),
        })?;
        Ok(())
    }
}
