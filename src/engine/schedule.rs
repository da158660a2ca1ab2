// ==========================================
// 制造运营管理系统 - 生产排程优化引擎
// ==========================================
// 模型: 0-1 整数规划 (good_lp)
// 变量: assign[任务][产线][时间槽], 默认 24 小时槽
// 目标: 最小化 Σ (槽位成本 + 换型成本) × 指派
//       槽位成本 = slot × (2 - priority), 高优先级任务延后更贵
// 约束: 1) 每个任务恰好指派一个 (产线, 槽)
//       2) 每个 (产线, 槽) 至多一个任务
//       3) 每个 (产线, 槽) 指派数量 <= 产线小时产能
// ==========================================

use crate::config::OptimizerSettings;
use crate::domain::allocation::{NewOptimizationRun, NewResourceAllocation};
use crate::domain::types::{
    AlertSeverity, AlertType, AllocationStatus, OptimizationType, ResourceType, RunStatus,
};
use crate::domain::NewAlert;
use crate::engine::outcome::{
    FailureReason, OptimizationPayload, OptimizeOutcome, ScheduleAssignment,
};
use crate::repository::error::RepositoryResult;
use crate::repository::{AlertRepository, AllocationRepository, ProductionRepository};
use chrono::{Duration, Utc};
use good_lp::{constraint, default_solver, variable, variables, Expression, Solution, SolverModel};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

// ==========================================
// ScheduleEngine - 排程引擎
// ==========================================
pub struct ScheduleEngine {
    production: Arc<ProductionRepository>,
    allocations: Arc<AllocationRepository>,
    alerts: Arc<AlertRepository>,
    settings: OptimizerSettings,
}

impl ScheduleEngine {
    pub fn new(
        production: Arc<ProductionRepository>,
        allocations: Arc<AllocationRepository>,
        alerts: Arc<AlertRepository>,
        settings: OptimizerSettings,
    ) -> Self {
        Self {
            production,
            allocations,
            alerts,
            settings,
        }
    }

    /// 执行一次生产排程优化
    ///
    /// 任务来源: production_jobs 表的 PENDING 行。
    /// 成功时 LABOR 分配行与任务状态翻转在同一事务内落库。
    pub fn optimize(&self) -> RepositoryResult<OptimizeOutcome> {
        let start = Instant::now();
        tracing::info!("开始生产排程优化");

        let jobs = self.production.pending_jobs()?;
        let lines = self.production.active_line_facts()?;
        let slots = self.settings.schedule_horizon_slots;

        let parameters = json!({
            "max_time_secs": self.settings.max_optimization_time_secs,
            "horizon_slots": slots,
            "job_count": jobs.len(),
            "line_count": lines.len(),
        });

        if jobs.is_empty() || lines.is_empty() {
            tracing::warn!("生产排程优化数据不足, 不调用求解器");
            return self.audit_failure(FailureReason::InsufficientData, parameters, start);
        }

        // ===== 建模: 0-1 变量按 任务 × 产线 × 槽 声明 =====
        let mut vars = variables!();
        let mut assign_vars: HashMap<(i64, i64, usize), good_lp::Variable> = HashMap::new();
        for job in &jobs {
            for line in &lines {
                for slot in 0..slots {
                    let var = vars.add(variable().binary());
                    assign_vars.insert((job.id, line.line_id, slot), var);
                }
            }
        }

        // 目标: 完工时间成本 + 换型成本
        let mut objective = Expression::from(0.0);
        for job in &jobs {
            let priority_weight = (2 - job.priority).max(0) as f64;
            for line in &lines {
                for slot in 0..slots {
                    let cost = slot as f64 * priority_weight + line.setup_cost;
                    objective += cost * assign_vars[&(job.id, line.line_id, slot)];
                }
            }
        }

        let mut problem = vars.minimise(objective).using(default_solver);

        // 约束 1: 每个任务恰好一个 (产线, 槽)
        for job in &jobs {
            let total = lines.iter().fold(Expression::from(0.0), |acc, line| {
                (0..slots).fold(acc, |inner, slot| {
                    inner + assign_vars[&(job.id, line.line_id, slot)]
                })
            });
            problem = problem.with(constraint!(total == 1.0));
        }

        // 约束 2 + 3: 槽占用与产能
        for line in &lines {
            for slot in 0..slots {
                let occupancy = jobs.iter().fold(Expression::from(0.0), |acc, job| {
                    acc + assign_vars[&(job.id, line.line_id, slot)]
                });
                problem = problem.with(constraint!(occupancy <= 1.0));

                let demand = jobs.iter().fold(Expression::from(0.0), |acc, job| {
                    acc + job.quantity as f64 * assign_vars[&(job.id, line.line_id, slot)]
                });
                problem = problem.with(constraint!(demand <= line.capacity_per_hour as f64));
            }
        }

        // ===== 求解 =====
        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(e) => {
                tracing::warn!(error = %e, "生产排程优化未找到最优解");
                self.raise_solver_alert(&e.to_string())?;
                return self.audit_failure(FailureReason::NoOptimalSolution, parameters, start);
            }
        };

        // ===== 结果提取 =====
        let now = Utc::now();
        let mut assignments = Vec::new();
        let mut new_allocations = Vec::new();
        let mut scheduled_job_ids = Vec::new();
        let mut objective_value = 0.0;

        for job in &jobs {
            let priority_weight = (2 - job.priority).max(0) as f64;
            'job_search: for line in &lines {
                for slot in 0..slots {
                    let var = assign_vars[&(job.id, line.line_id, slot)];
                    if solution.value(var) > 0.5 {
                        objective_value += slot as f64 * priority_weight + line.setup_cost;
                        let scheduled_time = now + Duration::hours(slot as i64);

                        assignments.push(ScheduleAssignment {
                            job_id: job.id,
                            product_id: job.product_id.clone(),
                            quantity: job.quantity,
                            priority: job.priority,
                            assigned_line: line.line_id,
                            line_name: line.name.clone(),
                            assigned_slot: slot,
                            scheduled_time,
                        });
                        new_allocations.push(NewResourceAllocation {
                            production_line_id: line.line_id,
                            resource_type: ResourceType::Labor,
                            resource_id: format!("job_{}", job.id),
                            allocated_quantity: 1.0,
                            allocation_date: scheduled_time,
                            status: AllocationStatus::Planned,
                        });
                        scheduled_job_ids.push(job.id);
                        break 'job_search;
                    }
                }
            }
        }

        let payload = OptimizationPayload::Schedule { assignments };
        let execution_time = start.elapsed().as_secs_f64();

        let run = NewOptimizationRun {
            optimization_type: OptimizationType::Production,
            parameters,
            results: serde_json::to_value(&payload)?,
            objective_value,
            execution_time_seconds: execution_time,
            status: RunStatus::Completed,
        };
        let run_id =
            self.allocations
                .apply_schedule_run(&run, &new_allocations, &scheduled_job_ids)?;

        tracing::info!(
            run_id = %run_id,
            objective_value,
            execution_time,
            "生产排程优化完成"
        );

        Ok(OptimizeOutcome::success(
            run_id,
            objective_value,
            execution_time,
            payload,
        ))
    }

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
            optimization_type: OptimizationType::Production,
            parameters,
            results: json!({}),
            objective_value: 0.0,
            execution_time_seconds: execution_time,
            status: RunStatus::Failed,
        };
        let run_id = self.allocations.record_run(&run)?;

        Ok(OptimizeOutcome::failed(reason, execution_time, Some(run_id)))
    }

    fn raise_solver_alert(&self, detail: &str) -> RepositoryResult<()> {
        // source_id 固定为优化类别: 同类失败在未解决前不重复发布
        self.alerts.raise(&NewAlert {
            alert_type: AlertType::ProductionIssue,
            severity: AlertSeverity::High,
            title: "生产排程求解失败".to_string(),
            message: format!("求解器未给出最优解: {}", detail),
            source_id: Some(OptimizationType::Production.as_str().to_string()),
            source_type: Some("OPTIMIZATION".to_string()),
        })?;
        Ok(())
    }
}
