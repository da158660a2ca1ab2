// ==========================================
// 制造运营管理系统 - 生产数据仓储
// ==========================================
// 职责: production_lines / production_records / production_jobs /
//       bill_of_materials 表的数据访问
// ==========================================

use crate::domain::production::{
    LineEfficiency, NewProductionRecord, ProductionJob, ProductionLine, ProductionLineFact,
    ProductionRecord,
};
use crate::domain::types::JobStatus;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// ProductionRepository - 生产仓储
// ==========================================
pub struct ProductionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 产线
    // ==========================================

    /// 新增产线
    pub fn insert_line(
        &self,
        name: &str,
        capacity_per_hour: i64,
        efficiency_target: f64,
        setup_cost: f64,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_lines (name, capacity_per_hour, efficiency_target, setup_cost, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            "#,
            params![name, capacity_per_hour, efficiency_target, setup_cost, Utc::now()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询所有启用中的产线
    pub fn find_active_lines(&self) -> RepositoryResult<Vec<ProductionLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, capacity_per_hour, efficiency_target, setup_cost, is_active
            FROM production_lines
            WHERE is_active = 1
            ORDER BY id
            "#,
        )?;

        let lines = stmt
            .query_map([], |row| {
                Ok(ProductionLine {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    capacity_per_hour: row.get(2)?,
                    efficiency_target: row.get(3)?,
                    setup_cost: row.get(4)?,
                    is_active: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<ProductionLine>>>()?;

        Ok(lines)
    }

    /// 排产用产线快照（仅启用产线）
    pub fn active_line_facts(&self) -> RepositoryResult<Vec<ProductionLineFact>> {
        Ok(self
            .find_active_lines()?
            .into_iter()
            .map(|line| ProductionLineFact {
                line_id: line.id,
                name: line.name,
                capacity_per_hour: line.capacity_per_hour,
                efficiency_target: line.efficiency_target,
                setup_cost: line.setup_cost,
            })
            .collect())
    }

    // ==========================================
    // 班次生产记录
    // ==========================================

    /// 写入班次生产记录（效率由录入数据推导）
    pub fn insert_record(&self, record: &NewProductionRecord) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let line_exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM production_lines WHERE id = ?1",
                params![record.production_line_id],
                |row| row.get(0),
            )
            .optional()?;
        if line_exists.is_none() {
            return Err(RepositoryError::NotFound {
                entity: "ProductionLine".to_string(),
                id: record.production_line_id.to_string(),
            });
        }

        conn.execute(
            r#"
            INSERT INTO production_records (
                production_line_id, product_id, shift_id,
                planned_quantity, actual_quantity, defective_quantity,
                downtime_minutes, quality_score, efficiency, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.production_line_id,
                record.product_id,
                record.shift_id,
                record.planned_quantity,
                record.actual_quantity,
                record.defective_quantity,
                record.downtime_minutes,
                record.quality_score,
                record.efficiency(),
                Utc::now(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 查询产线近 N 天的生产记录（新 -> 旧）
    pub fn records_since(
        &self,
        line_id: i64,
        days: i64,
    ) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let since: DateTime<Utc> = Utc::now() - Duration::days(days);

        let mut stmt = conn.prepare(
            r#"
            SELECT id, production_line_id, product_id, shift_id,
                   planned_quantity, actual_quantity, defective_quantity,
                   downtime_minutes, quality_score, efficiency, created_at
            FROM production_records
            WHERE production_line_id = ?1 AND created_at >= ?2
            ORDER BY created_at DESC
            "#,
        )?;

        let map_record = |row: &Row| -> SqliteResult<ProductionRecord> {
            Ok(ProductionRecord {
                id: row.get(0)?,
                production_line_id: row.get(1)?,
                product_id: row.get(2)?,
                shift_id: row.get(3)?,
                planned_quantity: row.get(4)?,
                actual_quantity: row.get(5)?,
                defective_quantity: row.get(6)?,
                downtime_minutes: row.get(7)?,
                quality_score: row.get(8)?,
                efficiency: row.get(9)?,
                created_at: row.get(10)?,
            })
        };

        let records = stmt
            .query_map(params![line_id, since], map_record)?
            .collect::<SqliteResult<Vec<ProductionRecord>>>()?;

        Ok(records)
    }

    /// 产线近 N 天平均实际产量（无记录时为 0）
    pub fn trailing_avg_actual(&self, line_id: i64, days: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let since: DateTime<Utc> = Utc::now() - Duration::days(days);

        let avg: Option<f64> = conn.query_row(
            r#"
            SELECT AVG(actual_quantity) FROM production_records
            WHERE production_line_id = ?1 AND created_at >= ?2
            "#,
            params![line_id, since],
            |row| row.get(0),
        )?;

        Ok(avg.unwrap_or(0.0))
    }

    /// 所有启用产线的近 N 天效率（百分比口径）
    ///
    /// current_efficiency = Σactual / Σplanned × 100（无记录或计划为 0 时记 0）
    /// target_efficiency  = efficiency_target × 100
    pub fn line_efficiencies(&self, days: i64) -> RepositoryResult<Vec<LineEfficiency>> {
        let conn = self.get_conn()?;
        let since: DateTime<Utc> = Utc::now() - Duration::days(days);

        let mut stmt = conn.prepare(
            r#"
            SELECT l.id, l.name, l.efficiency_target,
                   SUM(r.planned_quantity), SUM(r.actual_quantity)
            FROM production_lines l
            LEFT JOIN production_records r
                   ON r.production_line_id = l.id AND r.created_at >= ?1
            WHERE l.is_active = 1
            GROUP BY l.id, l.name, l.efficiency_target
            ORDER BY l.id
            "#,
        )?;

        let rows = stmt
            .query_map(params![since], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let efficiencies = rows
            .into_iter()
            .map(|(line_id, line_name, target, planned, actual)| {
                let planned = planned.unwrap_or(0);
                let actual = actual.unwrap_or(0);
                let current_efficiency = if planned > 0 {
                    actual as f64 / planned as f64 * 100.0
                } else {
                    0.0
                };
                LineEfficiency {
                    line_id,
                    line_name,
                    current_efficiency,
                    target_efficiency: target * 100.0,
                }
            })
            .collect();

        Ok(efficiencies)
    }

    // ==========================================
    // 待排产任务
    // ==========================================

    /// 任务入队（状态 PENDING）
    pub fn insert_job(
        &self,
        product_id: &str,
        quantity: i64,
        priority: i64,
        due_date: Option<DateTime<Utc>>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_jobs (product_id, quantity, priority, due_date, status, created_at)
            VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5)
            "#,
            params![product_id, quantity, priority, due_date, Utc::now()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询全部 PENDING 任务（按创建顺序）
    pub fn pending_jobs(&self) -> RepositoryResult<Vec<ProductionJob>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, product_id, quantity, priority, due_date
            FROM production_jobs
            WHERE status = 'PENDING'
            ORDER BY id
            "#,
        )?;

        let jobs = stmt
            .query_map([], |row| {
                Ok(ProductionJob {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    quantity: row.get(2)?,
                    priority: row.get(3)?,
                    due_date: row.get(4)?,
                    status: JobStatus::Pending,
                })
            })?
            .collect::<SqliteResult<Vec<ProductionJob>>>()?;

        Ok(jobs)
    }

    // ==========================================
    // 物料清单 (BOM)
    // ==========================================

    /// 写入/覆盖某产线对某物料的单位用量
    pub fn upsert_bom_row(
        &self,
        line_id: i64,
        item_id: i64,
        qty_per_unit: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO bill_of_materials (production_line_id, inventory_item_id, qty_per_unit)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(production_line_id, inventory_item_id)
            DO UPDATE SET qty_per_unit = excluded.qty_per_unit
            "#,
            params![line_id, item_id, qty_per_unit],
        )?;
        Ok(())
    }

    /// 某产线的 BOM 行: (物料 id, 单位用量)
    pub fn bom_rows(&self, line_id: i64) -> RepositoryResult<Vec<(i64, f64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT inventory_item_id, qty_per_unit
            FROM bill_of_materials
            WHERE production_line_id = ?1
            ORDER BY inventory_item_id
            "#,
        )?;

        let rows = stmt
            .query_map(params![line_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<SqliteResult<Vec<(i64, f64)>>>()?;

        Ok(rows)
    }
}
