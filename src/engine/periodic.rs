// ==========================================
// 制造运营管理系统 - 周期优化循环
// ==========================================
// 职责: 后台工作线程按固定间隔执行 库存分配 + 生产排程
// 取消: 关停信号在每次求解前与休眠期间都会被检查
// 容错: 单次迭代内的错误记录日志并通过类型化报告通道上送,
//       循环本身不退出
// ==========================================

use crate::engine::optimizer::Optimizer;
use crate::engine::outcome::{FailureReason, OptimizeOutcome, OutcomeStatus};
use crate::repository::error::RepositoryError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// ==========================================
// 迭代报告（观察方消费, 替代"只靠日志"）
// ==========================================

/// 单个优化步骤的结果
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// 入口正常返回（可能是预期内失败）
    Completed {
        status: OutcomeStatus,
        reason: Option<FailureReason>,
    },
    /// 持久化等意外错误, 已被循环吞掉
    Errored { message: String },
}

impl StepOutcome {
    fn from_result(result: Result<OptimizeOutcome, RepositoryError>) -> Self {
        match result {
            Ok(outcome) => StepOutcome::Completed {
                status: outcome.status,
                reason: outcome.reason,
            },
            Err(e) => StepOutcome::Errored {
                message: e.to_string(),
            },
        }
    }
}

/// 一次迭代的报告
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub sequence: u64,
    pub inventory: StepOutcome,
    pub schedule: Option<StepOutcome>,
}

// ==========================================
// PeriodicOptimizer - 周期优化器
// ==========================================

struct Worker {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
    // 每代工作线程各自持有存活标志, 不跨代复用
    running: Arc<AtomicBool>,
}

pub struct PeriodicOptimizer {
    optimizer: Arc<Optimizer>,
    interval: Duration,
    report_tx: Option<mpsc::Sender<IterationReport>>,
    worker: Mutex<Option<Worker>>,
}

impl PeriodicOptimizer {
    /// # 参数
    /// - report_tx: 可选的迭代报告通道, 观察方持有对应 Receiver
    pub fn new(
        optimizer: Arc<Optimizer>,
        interval: Duration,
        report_tx: Option<mpsc::Sender<IterationReport>>,
    ) -> Self {
        Self {
            optimizer,
            interval,
            report_tx,
            worker: Mutex::new(None),
        }
    }

    /// 当前工作线程是否仍在运行
    pub fn is_running(&self) -> bool {
        match self.worker.lock() {
            Ok(guard) => guard
                .as_ref()
                .map_or(false, |w| w.running.load(Ordering::SeqCst)),
            Err(_) => false,
        }
    }

    /// 启动周期优化（已在运行时为带告警的 no-op）
    pub fn start(&self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!(error = %e, "周期优化器内部锁已中毒, 无法启动");
                return;
            }
        };

        // 旧线程未回收前一律拒绝, 保证任意时刻至多一个工作线程
        if guard.is_some() {
            tracing::warn!("周期优化已在运行(或旧线程待回收), 忽略重复启动");
            return;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let optimizer = self.optimizer.clone();
        let interval = self.interval;
        let report_tx = self.report_tx.clone();
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = running.clone();
        let handle = std::thread::spawn(move || {
            run_loop(optimizer, interval, shutdown_rx, report_tx);
            thread_running.store(false, Ordering::SeqCst);
        });

        *guard = Some(Worker {
            shutdown_tx,
            handle,
            running,
        });
        tracing::info!(interval_secs = interval.as_secs(), "周期优化已启动");
    }

    /// 停止周期优化
    ///
    /// 协作式取消: 仅在下一次检查点生效（求解前或休眠中）。
    ///
    /// # 返回
    /// - true: 工作线程已在限时内退出（未启动时也视为成功）
    /// - false: 超过 join_timeout 仍未退出
    pub fn stop(&self, join_timeout: Duration) -> bool {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!(error = %e, "周期优化器内部锁已中毒, 无法停止");
                return false;
            }
        };

        let Some(worker) = guard.as_ref() else {
            tracing::info!("周期优化未在运行, stop 为 no-op");
            return true;
        };

        // 发送关停信号, 休眠中的 recv_timeout 立即醒来
        let _ = worker.shutdown_tx.send(());

        let deadline = Instant::now() + join_timeout;
        while !worker.handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        if worker.handle.is_finished() {
            if let Some(worker) = guard.take() {
                let _ = worker.handle.join();
            }
            tracing::info!("周期优化已停止");
            true
        } else {
            // 超时不丢句柄: 旧线程保持被跟踪, 由后续 stop 回收
            tracing::error!(
                timeout_secs = join_timeout.as_secs_f64(),
                "周期优化未能在限时内停止"
            );
            false
        }
    }
}

/// 工作线程主循环
fn run_loop(
    optimizer: Arc<Optimizer>,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
    report_tx: Option<mpsc::Sender<IterationReport>>,
) {
    let mut sequence: u64 = 0;

    loop {
        if shutdown_requested(&shutdown_rx) {
            break;
        }
        sequence += 1;

        let inventory = StepOutcome::from_result(optimizer.optimize_inventory_allocation());
        if let StepOutcome::Errored { message } = &inventory {
            tracing::error!(sequence, error = %message, "库存分配步骤出错, 循环继续");
        }

        // 第二次求解前再次检查取消信号
        let schedule = if shutdown_requested(&shutdown_rx) {
            send_report(&report_tx, IterationReport { sequence, inventory, schedule: None });
            break;
        } else {
            let schedule = StepOutcome::from_result(optimizer.optimize_production_schedule());
            if let StepOutcome::Errored { message } = &schedule {
                tracing::error!(sequence, error = %message, "生产排程步骤出错, 循环继续");
            }
            schedule
        };

        send_report(
            &report_tx,
            IterationReport {
                sequence,
                inventory,
                schedule: Some(schedule),
            },
        );

        // 休眠期间可被关停信号唤醒
        match shutdown_rx.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    tracing::info!(iterations = sequence, "周期优化循环退出");
}

fn shutdown_requested(shutdown_rx: &mpsc::Receiver<()>) -> bool {
    match shutdown_rx.try_recv() {
        Ok(()) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

fn send_report(report_tx: &Option<mpsc::Sender<IterationReport>>, report: IterationReport) {
    if let Some(tx) = report_tx {
        // 观察方掉线不影响循环
        let _ = tx.send(report);
    }
}
