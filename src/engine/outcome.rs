// ==========================================
// 制造运营管理系统 - 优化结果类型
// ==========================================
// 职责: 对外暴露的结构化优化结果
// 约定: 预期内失败(数据不足/无最优解)是值, 不是异常;
//       results 列存放带标签载荷, 下游不需要按形状猜测类型
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// OutcomeStatus / FailureReason
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// 输入数据不足, 未调用求解器
    InsufficientData,
    /// 求解器未在预算内给出最优解（不可行/无界/超时）
    NoOptimalSolution,
}

impl FailureReason {
    pub fn as_str(&self) -> &str {
        match self {
            FailureReason::InsufficientData => "insufficient_data",
            FailureReason::NoOptimalSolution => "no_optimal_solution",
        }
    }
}

// ==========================================
// 决策载荷
// ==========================================

/// 单条库存分配决策
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationLine {
    pub item_id: i64,
    pub part_number: String,
    pub line_id: i64,
    pub line_name: String,
    pub allocated_quantity: i64,
    pub unit_cost: f64,
}

/// 单条排产决策
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub job_id: i64,
    pub product_id: String,
    pub quantity: i64,
    pub priority: i64,
    pub assigned_line: i64,
    pub line_name: String,
    pub assigned_slot: usize,
    pub scheduled_time: DateTime<Utc>,
}

/// 利用率建议
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recommendation {
    /// 产线效率低于目标的 90%
    EfficiencyImprovement {
        line_id: i64,
        line_name: String,
        current_efficiency: f64,
        target_efficiency: f64,
        improvement_potential: f64,
        recommended_actions: Vec<String>,
    },
    /// 物料年化周转率低于 4
    InventoryOptimization {
        item_id: i64,
        part_number: String,
        current_stock: i64,
        turnover_rate: f64,
        recommended_actions: Vec<String>,
    },
}

/// 物料周转视图（利用率分析的指标部分）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTurnover {
    pub item_id: i64,
    pub part_number: String,
    pub current_stock: i64,
    pub turnover_rate: f64,
}

/// 利用率指标汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationMetrics {
    pub lines: Vec<crate::domain::production::LineEfficiency>,
    pub inventory: Vec<ItemTurnover>,
}

// ==========================================
// OptimizationPayload - 带标签的结果载荷
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizationPayload {
    Inventory {
        allocations: Vec<AllocationLine>,
    },
    Schedule {
        assignments: Vec<ScheduleAssignment>,
    },
    Utilization {
        recommendations: Vec<Recommendation>,
        metrics: UtilizationMetrics,
    },
}

// ==========================================
// OptimizeOutcome - 公开入口的统一返回
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeOutcome {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
    /// 墙钟耗时（秒）, 含模型构建
    pub execution_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<OptimizationPayload>,
}

impl OptimizeOutcome {
    pub fn success(
        run_id: String,
        objective_value: f64,
        execution_time: f64,
        payload: OptimizationPayload,
    ) -> Self {
        Self {
            status: OutcomeStatus::Success,
            reason: None,
            objective_value: Some(objective_value),
            execution_time,
            run_id: Some(run_id),
            payload: Some(payload),
        }
    }

    pub fn failed(reason: FailureReason, execution_time: f64, run_id: Option<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            reason: Some(reason),
            objective_value: None,
            execution_time,
            run_id,
            payload: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tagging() {
        let payload = OptimizationPayload::Inventory {
            allocations: vec![AllocationLine {
                item_id: 1,
                part_number: "PN-001".to_string(),
                line_id: 2,
                line_name: "一号线".to_string(),
                allocated_quantity: 30,
                unit_cost: 10.0,
            }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "inventory");
        assert_eq!(json["allocations"][0]["allocated_quantity"], 30);
    }

    #[test]
    fn test_failed_outcome_serialization() {
        let outcome = OptimizeOutcome::failed(FailureReason::InsufficientData, 0.01, None);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "insufficient_data");
        assert!(json.get("objective_value").is_none());
    }
}
