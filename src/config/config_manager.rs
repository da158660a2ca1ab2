// ==========================================
// 制造运营管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 默认值 (配置缺失时生效)
// ==========================================

/// 周期优化间隔（秒）
pub const DEFAULT_OPTIMIZATION_INTERVAL_SECS: u64 = 3_600;
/// 单次求解时间预算（秒）
pub const DEFAULT_MAX_OPTIMIZATION_TIME_SECS: u64 = 300;
/// 排产时间槽数（小时）
pub const DEFAULT_SCHEDULE_HORIZON_SLOTS: usize = 24;
/// 库存分配目标中的损耗罚系数
pub const DEFAULT_WASTE_PENALTY: f64 = 0.1;
/// 低库存阈值（占再订货点比例）
pub const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 0.2;
/// 补货安全系数
pub const DEFAULT_REORDER_SAFETY_FACTOR: f64 = 1.5;

// ==========================================
// OptimizerSettings - 优化引擎配置快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub optimization_interval_secs: u64,
    pub max_optimization_time_secs: u64,
    pub schedule_horizon_slots: usize,
    pub waste_penalty: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            optimization_interval_secs: DEFAULT_OPTIMIZATION_INTERVAL_SECS,
            max_optimization_time_secs: DEFAULT_MAX_OPTIMIZATION_TIME_SECS,
            schedule_horizon_slots: DEFAULT_SCHEDULE_HORIZON_SLOTS,
            waste_penalty: DEFAULT_WASTE_PENALTY,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    fn get_u64(&self, key: &str, default: u64) -> Result<u64, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<u64>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(key, raw, "配置值无法解析为整数, 使用默认值");
                Ok(default)
            }
        }
    }

    fn get_f64(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<f64>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(key, raw, "配置值无法解析为浮点数, 使用默认值");
                Ok(default)
            }
        }
    }

    /// 周期优化间隔（秒）
    pub fn optimization_interval_secs(&self) -> Result<u64, Box<dyn Error>> {
        self.get_u64(
            "optimizer/interval_secs",
            DEFAULT_OPTIMIZATION_INTERVAL_SECS,
        )
    }

    /// 单次求解时间预算（秒）
    pub fn max_optimization_time_secs(&self) -> Result<u64, Box<dyn Error>> {
        self.get_u64(
            "optimizer/max_time_secs",
            DEFAULT_MAX_OPTIMIZATION_TIME_SECS,
        )
    }

    /// 排产时间槽数
    pub fn schedule_horizon_slots(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.get_u64(
            "optimizer/schedule_horizon_slots",
            DEFAULT_SCHEDULE_HORIZON_SLOTS as u64,
        )? as usize)
    }

    /// 损耗罚系数
    pub fn waste_penalty(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64("optimizer/waste_penalty", DEFAULT_WASTE_PENALTY)
    }

    /// 补货安全系数
    pub fn reorder_safety_factor(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64(
            "inventory/reorder_safety_factor",
            DEFAULT_REORDER_SAFETY_FACTOR,
        )
    }

    /// 低库存阈值
    pub fn low_stock_threshold(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64("inventory/low_stock_threshold", DEFAULT_LOW_STOCK_THRESHOLD)
    }

    /// 优化引擎配置快照（一次读取, 引擎内不再查库）
    pub fn optimizer_settings(&self) -> Result<OptimizerSettings, Box<dyn Error>> {
        Ok(OptimizerSettings {
            optimization_interval_secs: self.optimization_interval_secs()?,
            max_optimization_time_secs: self.max_optimization_time_secs()?,
            schedule_horizon_slots: self.schedule_horizon_slots()?,
            waste_penalty: self.waste_penalty()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let mgr = test_manager();
        let settings = mgr.optimizer_settings().unwrap();
        assert_eq!(
            settings.optimization_interval_secs,
            DEFAULT_OPTIMIZATION_INTERVAL_SECS
        );
        assert_eq!(settings.schedule_horizon_slots, DEFAULT_SCHEDULE_HORIZON_SLOTS);
        assert!((settings.waste_penalty - DEFAULT_WASTE_PENALTY).abs() < 1e-12);
        assert!(
            (mgr.low_stock_threshold().unwrap() - DEFAULT_LOW_STOCK_THRESHOLD).abs() < 1e-12
        );
    }

    #[test]
    fn test_override_and_bad_value_fallback() {
        let mgr = test_manager();
        mgr.set_config_value("optimizer/interval_secs", "60").unwrap();
        assert_eq!(mgr.optimization_interval_secs().unwrap(), 60);

        mgr.set_config_value("optimizer/waste_penalty", "not-a-number")
            .unwrap();
        assert!(
            (mgr.waste_penalty().unwrap() - DEFAULT_WASTE_PENALTY).abs() < 1e-12
        );
    }
}
