// ==========================================
// 制造运营管理系统 - 优化结果数据仓储
// ==========================================
// 职责: resource_allocations / optimization_runs 表的数据访问
// 约束: 一次优化的全部写入在同一事务内完成, 失败整体回滚
// ==========================================

use crate::domain::allocation::{
    NewOptimizationRun, NewResourceAllocation, ResourceAllocation, RunHistoryEntry,
};
use crate::domain::types::{AllocationStatus, OptimizationType, ResourceType, RunStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row, Transaction};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// AllocationRepository - 优化结果仓储
// ==========================================
pub struct AllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn insert_run_tx(tx: &Transaction, run: &NewOptimizationRun) -> RepositoryResult<String> {
        let run_id = Uuid::new_v4().to_string();
        tx.execute(
            r#"
            INSERT INTO optimization_runs (
                id, optimization_type, parameters, results,
                objective_value, execution_time_seconds, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run_id,
                run.optimization_type.as_str(),
                serde_json::to_string(&run.parameters)?,
                serde_json::to_string(&run.results)?,
                run.objective_value,
                run.execution_time_seconds,
                run.status.as_str(),
                Utc::now(),
            ],
        )?;
        Ok(run_id)
    }

    fn insert_allocation_tx(
        tx: &Transaction,
        alloc: &NewResourceAllocation,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO resource_allocations (
                production_line_id, resource_type, resource_id,
                allocated_quantity, allocation_date, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                alloc.production_line_id,
                alloc.resource_type.as_str(),
                alloc.resource_id,
                alloc.allocated_quantity,
                alloc.allocation_date,
                alloc.status.as_str(),
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// 仅写入审计记录（用于失败路径: FAILED 运行没有决策行）
    pub fn record_run(&self, run: &NewOptimizationRun) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let run_id = Self::insert_run_tx(&tx, run)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(run_id)
    }

    /// 应用库存分配结果: 审计记录 + MATERIAL 分配行, 同一事务
    pub fn apply_inventory_run(
        &self,
        run: &NewOptimizationRun,
        allocations: &[NewResourceAllocation],
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let run_id = Self::insert_run_tx(&tx, run)?;
        for alloc in allocations {
            Self::insert_allocation_tx(&tx, alloc)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(run_id = %run_id, count = allocations.len(), "库存分配结果已落库");
        Ok(run_id)
    }

    /// 应用排产结果: 审计记录 + LABOR 分配行 + 任务状态翻转, 同一事务
    pub fn apply_schedule_run(
        &self,
        run: &NewOptimizationRun,
        allocations: &[NewResourceAllocation],
        scheduled_job_ids: &[i64],
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let run_id = Self::insert_run_tx(&tx, run)?;
        for alloc in allocations {
            Self::insert_allocation_tx(&tx, alloc)?;
        }
        for job_id in scheduled_job_ids {
            tx.execute(
                "UPDATE production_jobs SET status = 'SCHEDULED' WHERE id = ?1",
                params![job_id],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(run_id = %run_id, jobs = scheduled_job_ids.len(), "排产结果已落库");
        Ok(run_id)
    }

    /// 查询某产线的分配行（新 -> 旧）
    pub fn allocations_for_line(
        &self,
        line_id: i64,
        limit: i64,
    ) -> RepositoryResult<Vec<ResourceAllocation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, production_line_id, resource_type, resource_id,
                   allocated_quantity, allocation_date, status
            FROM resource_allocations
            WHERE production_line_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let allocations = stmt
            .query_map(params![line_id, limit], Self::map_allocation)?
            .collect::<SqliteResult<Vec<ResourceAllocation>>>()?;

        Ok(allocations)
    }

    fn map_allocation(row: &Row) -> SqliteResult<ResourceAllocation> {
        let raw_type: String = row.get(2)?;
        let raw_status: String = row.get(6)?;
        Ok(ResourceAllocation {
            id: row.get(0)?,
            production_line_id: row.get(1)?,
            resource_type: ResourceType::parse(&raw_type).unwrap_or(ResourceType::Material),
            resource_id: row.get(3)?,
            allocated_quantity: row.get(4)?,
            allocation_date: row.get(5)?,
            status: match raw_status.as_str() {
                "ACTIVE" => AllocationStatus::Active,
                "COMPLETED" => AllocationStatus::Completed,
                _ => AllocationStatus::Planned,
            },
        })
    }

    /// 优化历史查询（新 -> 旧）
    ///
    /// # 参数
    /// - optimization_type: 为 None 时不过滤类别
    /// - days: 回溯天数
    pub fn history(
        &self,
        optimization_type: Option<OptimizationType>,
        days: i64,
    ) -> RepositoryResult<Vec<RunHistoryEntry>> {
        let conn = self.get_conn()?;
        let since: DateTime<Utc> = Utc::now() - Duration::days(days);

        let map_entry = |row: &Row| -> SqliteResult<RunHistoryEntry> {
            let raw_type: String = row.get(1)?;
            let raw_status: String = row.get(4)?;
            let raw_results: String = row.get(6)?;
            Ok(RunHistoryEntry {
                id: row.get(0)?,
                optimization_type: OptimizationType::parse(&raw_type)
                    .unwrap_or(OptimizationType::Resource),
                objective_value: row.get(2)?,
                execution_time_seconds: row.get(3)?,
                status: RunStatus::parse(&raw_status).unwrap_or(RunStatus::Failed),
                created_at: row.get(5)?,
                results_summary: summarize_results(&raw_results),
            })
        };

        let entries = match optimization_type {
            Some(ot) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, optimization_type, objective_value, execution_time_seconds,
                           status, created_at, results
                    FROM optimization_runs
                    WHERE created_at >= ?1 AND optimization_type = ?2
                    ORDER BY created_at DESC
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![since, ot.as_str()], map_entry)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, optimization_type, objective_value, execution_time_seconds,
                           status, created_at, results
                    FROM optimization_runs
                    WHERE created_at >= ?1
                    ORDER BY created_at DESC
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![since], map_entry)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
        };

        Ok(entries)
    }
}

/// 根据 results 列的带标签载荷生成一行摘要
///
/// 载荷为空对象时（失败运行）返回固定文案
fn summarize_results(raw: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return "无法解析的结果载荷".to_string(),
    };

    match value.get("kind").and_then(|k| k.as_str()) {
        Some("inventory") => {
            let count = value
                .get("allocations")
                .and_then(|a| a.as_array())
                .map(|a| a.len())
                .unwrap_or(0);
            format!("库存分配: {} 条分配", count)
        }
        Some("schedule") => {
            let count = value
                .get("assignments")
                .and_then(|a| a.as_array())
                .map(|a| a.len())
                .unwrap_or(0);
            format!("生产排程: {} 个任务", count)
        }
        Some("utilization") => {
            let count = value
                .get("recommendations")
                .and_then(|a| a.as_array())
                .map(|a| a.len())
                .unwrap_or(0);
            format!("资源利用率: {} 条建议", count)
        }
        _ => "无结果".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_results_variants() {
        let inv = r#"{"kind":"inventory","allocations":[{},{}]}"#;
        assert_eq!(summarize_results(inv), "库存分配: 2 条分配");

        let sched = r#"{"kind":"schedule","assignments":[{}]}"#;
        assert_eq!(summarize_results(sched), "生产排程: 1 个任务");

        let util = r#"{"kind":"utilization","recommendations":[]}"#;
        assert_eq!(summarize_results(util), "资源利用率: 0 条建议");

        assert_eq!(summarize_results("{}"), "无结果");
        assert_eq!(summarize_results("not json"), "无法解析的结果载荷");
    }
}
