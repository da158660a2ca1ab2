// ==========================================
// 制造运营管理系统 - 优化引擎层
// ==========================================
// 职责: 库存分配 / 生产排程的整数规划求解,
//       资源利用率启发式分析, 以及周期优化循环
// ==========================================

pub mod allocation;
pub mod optimizer;
pub mod outcome;
pub mod periodic;
pub mod requirements;
pub mod schedule;
pub mod utilization;

pub use allocation::AllocationEngine;
pub use optimizer::Optimizer;
pub use outcome::{
    AllocationLine, FailureReason, ItemTurnover, OptimizationPayload, OptimizeOutcome,
    OutcomeStatus, Recommendation, ScheduleAssignment, UtilizationMetrics,
};
pub use periodic::{IterationReport, PeriodicOptimizer, StepOutcome};
pub use requirements::{BomProvider, FixedBomProvider, TableBomProvider};
pub use schedule::ScheduleEngine;
pub use utilization::UtilizationAdvisor;
