// ==========================================
// 制造运营管理系统 - 告警数据仓储
// ==========================================
// 职责: alerts 表的数据访问
// 去重: 同源同类型的未解决告警只保留一条
// ==========================================

use crate::domain::allocation::NewAlert;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 告警视图（查询用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertView {
    pub id: i64,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub source_id: Option<String>,
    pub source_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// AlertRepository - 告警仓储
// ==========================================
pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入告警（同源未解决告警去重, 返回是否实际写入）
    pub fn raise(&self, alert: &NewAlert) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        if let Some(source_id) = &alert.source_id {
            let existing: Option<i64> = conn
                .query_row(
                    r#"
                    SELECT id FROM alerts
                    WHERE source_id = ?1 AND alert_type = ?2 AND is_resolved = 0
                    LIMIT 1
                    "#,
                    params![source_id, alert.alert_type.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(false);
            }
        }

        conn.execute(
            r#"
            INSERT INTO alerts (
                alert_type, severity, title, message,
                source_id, source_type, is_resolved, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
            "#,
            params![
                alert.alert_type.as_str(),
                alert.severity.as_str(),
                alert.title,
                alert.message,
                alert.source_id,
                alert.source_type,
                Utc::now(),
            ],
        )?;

        Ok(true)
    }

    /// 查询未解决告警（新 -> 旧）
    pub fn open_alerts(&self) -> RepositoryResult<Vec<AlertView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, alert_type, severity, title, message, source_id, source_type, created_at
            FROM alerts
            WHERE is_resolved = 0
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let alerts = stmt
            .query_map([], |row| {
                Ok(AlertView {
                    id: row.get(0)?,
                    alert_type: row.get(1)?,
                    severity: row.get(2)?,
                    title: row.get(3)?,
                    message: row.get(4)?,
                    source_id: row.get(5)?,
                    source_type: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<SqliteResult<Vec<AlertView>>>()?;

        Ok(alerts)
    }

    /// 标记告警已解决
    pub fn resolve(&self, alert_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE alerts SET is_resolved = 1 WHERE id = ?1",
            params![alert_id],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Alert".to_string(),
                id: alert_id.to_string(),
            });
        }
        Ok(())
    }
}
