// ==========================================
// 制造运营管理系统 - 库存数据仓储
// ==========================================
// 职责: inventory_items / stock_movements 表的数据访问
// 红线: Repository 不含业务流程编排
// ==========================================

use crate::domain::inventory::{
    InventoryFact, InventoryItem, NewInventoryItem, StockMovement, StockValuation, Supplier,
};
use crate::domain::types::MovementType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// InventoryRepository - 库存仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射: inventory_items -> InventoryItem
    fn map_item(row: &Row) -> SqliteResult<InventoryItem> {
        Ok(InventoryItem {
            id: row.get(0)?,
            part_number: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            unit_cost: row.get(4)?,
            current_stock: row.get(5)?,
            minimum_stock: row.get(6)?,
            maximum_stock: row.get(7)?,
            reorder_point: row.get(8)?,
            reorder_quantity: row.get(9)?,
            supplier_id: row.get(10)?,
            location: row.get(11)?,
            is_active: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    const ITEM_COLUMNS: &'static str = r#"
        id, part_number, name, category, unit_cost,
        current_stock, minimum_stock, maximum_stock, reorder_point, reorder_quantity,
        supplier_id, location, is_active, created_at, updated_at
    "#;

    /// 新增物料
    ///
    /// # 返回
    /// - Ok(i64): 新物料 id
    /// - Err: 唯一约束冲突(part_number)或数据库错误
    pub fn insert_item(&self, item: &NewInventoryItem) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO inventory_items (
                part_number, name, category, unit_cost,
                current_stock, minimum_stock, maximum_stock, reorder_point, reorder_quantity,
                supplier_id, location, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)
            "#,
            params![
                item.part_number,
                item.name,
                item.category,
                item.unit_cost,
                item.current_stock,
                item.minimum_stock,
                item.maximum_stock,
                item.reorder_point,
                item.reorder_quantity,
                item.supplier_id,
                item.location,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 查询所有启用中的物料
    pub fn find_active_items(&self) -> RepositoryResult<Vec<InventoryItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM inventory_items WHERE is_active = 1 ORDER BY part_number",
            Self::ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let items = stmt
            .query_map([], Self::map_item)?
            .collect::<SqliteResult<Vec<InventoryItem>>>()?;

        Ok(items)
    }

    /// 按 id 查询单个物料
    pub fn find_by_id(&self, item_id: i64) -> RepositoryResult<Option<InventoryItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM inventory_items WHERE id = ?1",
            Self::ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let item = stmt.query_row(params![item_id], Self::map_item).optional()?;
        Ok(item)
    }

    /// 优化引擎用的只读库存快照（仅启用物料）
    pub fn active_facts(&self) -> RepositoryResult<Vec<InventoryFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, part_number, unit_cost, current_stock, reorder_point
            FROM inventory_items
            WHERE is_active = 1
            ORDER BY id
            "#,
        )?;

        let facts = stmt
            .query_map([], |row| {
                Ok(InventoryFact {
                    item_id: row.get(0)?,
                    part_number: row.get(1)?,
                    unit_cost: row.get(2)?,
                    current_stock: row.get(3)?,
                    reorder_point: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<InventoryFact>>>()?;

        Ok(facts)
    }

    /// 低库存物料（current_stock <= reorder_point）
    pub fn low_stock_items(&self) -> RepositoryResult<Vec<InventoryItem>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM inventory_items
            WHERE is_active = 1 AND current_stock <= reorder_point
            ORDER BY current_stock
            "#,
            Self::ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let items = stmt
            .query_map([], Self::map_item)?
            .collect::<SqliteResult<Vec<InventoryItem>>>()?;

        Ok(items)
    }

    /// 库存变更（流水驱动）
    ///
    /// 同一事务内完成:
    /// 1. 更新 inventory_items.current_stock
    /// 2. 写入 stock_movements 流水
    /// 3. 触发低库存告警（同源未解决告警去重）
    ///
    /// # 语义
    /// - IN: 库存 += quantity
    /// - OUT: 库存 -= quantity, 不允许为负
    /// - ADJUSTMENT: 库存 = quantity, 流水记录差值
    ///
    /// # 返回
    /// - Ok((old, new)): 变更前后库存
    pub fn update_stock(
        &self,
        item_id: i64,
        quantity: i64,
        movement_type: MovementType,
        reference_number: Option<&str>,
        reason: Option<&str>,
        operator: Option<&str>,
    ) -> RepositoryResult<(i64, i64)> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let row = tx
            .query_row(
                "SELECT current_stock, name, reorder_point FROM inventory_items WHERE id = ?1",
                params![item_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let (old_stock, name, reorder_point) = row.ok_or_else(|| RepositoryError::NotFound {
            entity: "InventoryItem".to_string(),
            id: item_id.to_string(),
        })?;

        let new_stock = match movement_type {
            MovementType::In => old_stock + quantity,
            MovementType::Out => {
                let remaining = old_stock - quantity;
                if remaining < 0 {
                    return Err(RepositoryError::InsufficientStock {
                        item_id,
                        current: old_stock,
                        requested: quantity,
                    });
                }
                remaining
            }
            MovementType::Adjustment => quantity,
        };

        let now = Utc::now();
        tx.execute(
            "UPDATE inventory_items SET current_stock = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_stock, now, item_id],
        )?;

        // ADJUSTMENT 的流水数量记录实际差值
        let movement_quantity = match movement_type {
            MovementType::Adjustment => new_stock - old_stock,
            _ => quantity,
        };
        tx.execute(
            r#"
            INSERT INTO stock_movements (
                inventory_item_id, movement_type, quantity,
                reference_number, reason, operator, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                item_id,
                movement_type.as_str(),
                movement_quantity,
                reference_number,
                reason,
                operator,
                now,
            ],
        )?;

        // 低库存告警钩子: 同源存在未解决 LOW_STOCK 告警时不重复
        if new_stock <= reorder_point {
            let existing: Option<i64> = tx
                .query_row(
                    r#"
                    SELECT id FROM alerts
                    WHERE source_id = ?1 AND source_type = 'INVENTORY'
                      AND alert_type = 'LOW_STOCK' AND is_resolved = 0
                    LIMIT 1
                    "#,
                    params![item_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_none() {
                let severity = if new_stock <= 0 { "HIGH" } else { "MEDIUM" };
                tx.execute(
                    r#"
                    INSERT INTO alerts (
                        alert_type, severity, title, message,
                        source_id, source_type, is_resolved, created_at
                    ) VALUES ('LOW_STOCK', ?1, ?2, ?3, ?4, 'INVENTORY', 0, ?5)
                    "#,
                    params![
                        severity,
                        format!("低库存告警: {}", name),
                        format!(
                            "库存水平 ({}) 已达到或低于再订货点 ({})",
                            new_stock, reorder_point
                        ),
                        item_id.to_string(),
                        now,
                    ],
                )?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(item_id, old_stock, new_stock, "库存已更新");
        Ok((old_stock, new_stock))
    }

    /// 库存流水历史（新 -> 旧）
    ///
    /// # 参数
    /// - item_id: 为 None 时查询全部物料
    /// - limit: 返回条数上限
    pub fn movement_history(
        &self,
        item_id: Option<i64>,
        limit: i64,
    ) -> RepositoryResult<Vec<StockMovement>> {
        let conn = self.get_conn()?;

        let map_movement = |row: &Row| -> SqliteResult<StockMovement> {
            let raw_type: String = row.get(2)?;
            Ok(StockMovement {
                id: row.get(0)?,
                inventory_item_id: row.get(1)?,
                movement_type: MovementType::parse(&raw_type)
                    .unwrap_or(MovementType::Adjustment),
                quantity: row.get(3)?,
                reference_number: row.get(4)?,
                reason: row.get(5)?,
                operator: row.get(6)?,
                created_at: row.get(7)?,
            })
        };

        let movements = match item_id {
            Some(id) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, inventory_item_id, movement_type, quantity,
                           reference_number, reason, operator, created_at
                    FROM stock_movements
                    WHERE inventory_item_id = ?1
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?2
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![id, limit], map_movement)?
                    .collect::<SqliteResult<Vec<StockMovement>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, inventory_item_id, movement_type, quantity,
                           reference_number, reason, operator, created_at
                    FROM stock_movements
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?1
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![limit], map_movement)?
                    .collect::<SqliteResult<Vec<StockMovement>>>()?;
                rows
            }
        };

        Ok(movements)
    }

    /// 近 N 天 OUT 流水总量
    pub fn out_total_since(&self, item_id: i64, days: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let since: DateTime<Utc> = Utc::now() - Duration::days(days);

        let total: Option<i64> = conn.query_row(
            r#"
            SELECT SUM(quantity) FROM stock_movements
            WHERE inventory_item_id = ?1 AND movement_type = 'OUT' AND created_at >= ?2
            "#,
            params![item_id, since],
            |row| row.get(0),
        )?;

        Ok(total.unwrap_or(0))
    }

    /// 日均消耗（近 N 天 OUT 总量 / N）
    pub fn avg_daily_consumption(&self, item_id: i64, days: i64) -> RepositoryResult<f64> {
        if days <= 0 {
            return Ok(0.0);
        }
        Ok(self.out_total_since(item_id, days)? as f64 / days as f64)
    }

    /// 新增供应商
    pub fn insert_supplier(&self, name: &str, lead_time_days: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO suppliers (name, lead_time_days, is_active, created_at)
            VALUES (?1, ?2, 1, ?3)
            "#,
            params![name, lead_time_days, Utc::now()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询所有启用中的供应商
    pub fn active_suppliers(&self) -> RepositoryResult<Vec<Supplier>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, lead_time_days, is_active
            FROM suppliers
            WHERE is_active = 1
            ORDER BY name
            "#,
        )?;

        let suppliers = stmt
            .query_map([], |row| {
                Ok(Supplier {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    lead_time_days: row.get(2)?,
                    is_active: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<Supplier>>>()?;

        Ok(suppliers)
    }

    /// 库存估值（启用物料）
    pub fn valuation(&self) -> RepositoryResult<StockValuation> {
        let conn = self.get_conn()?;

        let (total_value, total_items, unique_parts): (Option<f64>, Option<i64>, i64) = conn
            .query_row(
                r#"
                SELECT SUM(current_stock * unit_cost), SUM(current_stock), COUNT(*)
                FROM inventory_items
                WHERE is_active = 1
                "#,
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        Ok(StockValuation {
            total_value: total_value.unwrap_or(0.0),
            total_items: total_items.unwrap_or(0),
            unique_parts: unique_parts as usize,
            calculated_at: Utc::now(),
        })
    }
}
