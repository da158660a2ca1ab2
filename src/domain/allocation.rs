// ==========================================
// 制造运营管理系统 - 资源分配与优化审计模型
// ==========================================
// 覆盖: 资源分配行 / 优化运行审计 / 告警
// ==========================================

use crate::domain::types::{
    AlertSeverity, AlertType, AllocationStatus, OptimizationType, ResourceType, RunStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ResourceAllocation - 资源分配行
// ==========================================
// MATERIAL: resource_id = 物料 id, 来自库存分配优化
// LABOR:    resource_id = "job_{id}", 来自排产优化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub id: i64,
    pub production_line_id: i64,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub allocated_quantity: f64,
    pub allocation_date: DateTime<Utc>,
    pub status: AllocationStatus,
}

// ==========================================
// NewResourceAllocation - 待写入的分配行
// ==========================================
#[derive(Debug, Clone)]
pub struct NewResourceAllocation {
    pub production_line_id: i64,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub allocated_quantity: f64,
    pub allocation_date: DateTime<Utc>,
    pub status: AllocationStatus,
}

// ==========================================
// NewOptimizationRun - 待写入的审计记录
// ==========================================
// id/created_at 由仓储生成
#[derive(Debug, Clone)]
pub struct NewOptimizationRun {
    pub optimization_type: OptimizationType,
    pub parameters: serde_json::Value,
    pub results: serde_json::Value,
    pub objective_value: f64,
    pub execution_time_seconds: f64,
    pub status: RunStatus,
}

// ==========================================
// OptimizationRun - 优化运行审计记录
// ==========================================
// 仅追加, 创建后不再变更。求解失败同样落一条 FAILED 记录,
// 失败原因写入 parameters。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub id: String,
    pub optimization_type: OptimizationType,
    pub parameters: serde_json::Value,
    pub results: serde_json::Value,
    pub objective_value: f64,
    pub execution_time_seconds: f64,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// RunHistoryEntry - 历史查询条目
// ==========================================
// results 列反序列化后做摘要, 不向调用方透传整个 blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunHistoryEntry {
    pub id: String,
    pub optimization_type: OptimizationType,
    pub objective_value: f64,
    pub execution_time_seconds: f64,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub results_summary: String,
}

// ==========================================
// NewAlert - 待写入告警
// ==========================================
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub source_id: Option<String>,
    pub source_type: Option<String>,
}
