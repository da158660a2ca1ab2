// ==========================================
// 制造运营管理系统 - 优化 API
// ==========================================
// 职责: 三类优化入口 / 优化历史查询 / 周期优化的启停
// 约定: 预期内的失败（数据不足/无可行解）作为 OptimizeOutcome 返回,
//       只有持久化等意外错误才走 Err
// ==========================================

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::allocation::RunHistoryEntry;
use crate::domain::types::OptimizationType;
use crate::engine::optimizer::Optimizer;
use crate::engine::outcome::OptimizeOutcome;
use crate::engine::periodic::{IterationReport, PeriodicOptimizer};

/// 历史查询默认回溯天数
const DEFAULT_HISTORY_DAYS: i64 = 30;
/// stop 的默认等待时长
const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

// ==========================================
// OptimizationApi - 优化 API
// ==========================================

/// 优化API
///
/// 职责：
/// 1. 按需触发库存分配 / 生产排程 / 资源利用率分析
/// 2. 优化历史查询
/// 3. 周期优化循环的启停
pub struct OptimizationApi {
    optimizer: Arc<Optimizer>,
    periodic: PeriodicOptimizer,
}

impl OptimizationApi {
    /// # 参数
    /// - interval: 周期优化间隔
    ///
    /// # 返回
    /// - (api, report_rx): 迭代报告接收端交给调用方消费
    pub fn new(
        optimizer: Arc<Optimizer>,
        interval: Duration,
    ) -> (Self, mpsc::Receiver<IterationReport>) {
        let (report_tx, report_rx) = mpsc::channel();
        let periodic = PeriodicOptimizer::new(optimizer.clone(), interval, Some(report_tx));
        (
            Self {
                optimizer,
                periodic,
            },
            report_rx,
        )
    }

    // ==========================================
    // 按需优化
    // ==========================================

    /// 库存分配优化
    pub fn optimize_inventory(&self) -> ApiResult<OptimizeOutcome> {
        Ok(self.optimizer.optimize_inventory_allocation()?)
    }

    /// 生产排程优化
    pub fn optimize_schedule(&self) -> ApiResult<OptimizeOutcome> {
        Ok(self.optimizer.optimize_production_schedule()?)
    }

    /// 资源利用率分析
    pub fn analyze_utilization(&self) -> ApiResult<OptimizeOutcome> {
        Ok(self.optimizer.optimize_resource_utilization()?)
    }

    // ==========================================
    // 历史
    // ==========================================

    /// 优化历史（新 -> 旧）
    pub fn history(
        &self,
        optimization_type: Option<OptimizationType>,
        days: Option<i64>,
    ) -> ApiResult<Vec<RunHistoryEntry>> {
        let days = days.unwrap_or(DEFAULT_HISTORY_DAYS);
        if days <= 0 {
            return Err(ApiError::InvalidInput(format!("days 必须为正, 实际{}", days)));
        }
        Ok(self.optimizer.optimization_history(optimization_type, days)?)
    }

    // ==========================================
    // 周期优化
    // ==========================================

    /// 启动周期优化（已在运行时为 no-op）
    pub fn start_periodic(&self) {
        self.periodic.start();
    }

    /// 停止周期优化, 最多等待 10 秒
    pub fn stop_periodic(&self) -> bool {
        self.periodic.stop(DEFAULT_JOIN_TIMEOUT)
    }

    /// 周期优化是否在运行
    pub fn periodic_running(&self) -> bool {
        self.periodic.is_running()
    }
}
