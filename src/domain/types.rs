// ==========================================
// 制造运营管理系统 - 领域枚举类型
// ==========================================
// 职责: 定义全系统共享的状态/类别枚举
// 约定: 数据库中以大写字符串存储, as_str/parse 成对出现
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// MovementType - 库存流水类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    /// 入库
    In,
    /// 出库
    Out,
    /// 盘点调整（数量为调整后的绝对值）
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(MovementType::In),
            "OUT" => Some(MovementType::Out),
            "ADJUSTMENT" => Some(MovementType::Adjustment),
            _ => None,
        }
    }
}

// ==========================================
// StockStatus - 库存水平状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    /// 缺货
    OutOfStock,
    /// 低库存（<= 再订货点）
    LowStock,
    /// 正常
    Normal,
    /// 超储（>= 最大库存）
    Overstock,
}

impl StockStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StockStatus::OutOfStock => "OUT_OF_STOCK",
            StockStatus::LowStock => "LOW_STOCK",
            StockStatus::Normal => "NORMAL",
            StockStatus::Overstock => "OVERSTOCK",
        }
    }
}

// ==========================================
// ResourceType - 资源分配类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    /// 物料分配（库存优化结果）
    Material,
    /// 工时分配（排产优化结果）
    Labor,
    /// 设备分配
    Equipment,
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Material => "MATERIAL",
            ResourceType::Labor => "LABOR",
            ResourceType::Equipment => "EQUIPMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MATERIAL" => Some(ResourceType::Material),
            "LABOR" => Some(ResourceType::Labor),
            "EQUIPMENT" => Some(ResourceType::Equipment),
            _ => None,
        }
    }
}

// ==========================================
// AllocationStatus - 资源分配状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStatus {
    Planned,
    Active,
    Completed,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AllocationStatus::Planned => "PLANNED",
            AllocationStatus::Active => "ACTIVE",
            AllocationStatus::Completed => "COMPLETED",
        }
    }
}

// ==========================================
// OptimizationType - 优化类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationType {
    /// 库存分配优化
    Inventory,
    /// 生产排程优化
    Production,
    /// 资源利用率分析
    Resource,
}

impl OptimizationType {
    pub fn as_str(&self) -> &str {
        match self {
            OptimizationType::Inventory => "INVENTORY",
            OptimizationType::Production => "PRODUCTION",
            OptimizationType::Resource => "RESOURCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INVENTORY" => Some(OptimizationType::Inventory),
            "PRODUCTION" => Some(OptimizationType::Production),
            "RESOURCE" => Some(OptimizationType::Resource),
            _ => None,
        }
    }
}

// ==========================================
// RunStatus - 优化运行状态
// ==========================================
// 审计表 optimization_runs 仅追加, 状态在创建后不再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COMPLETED" => Some(RunStatus::Completed),
            "FAILED" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

// ==========================================
// JobStatus - 待排产任务状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Scheduled,
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Scheduled => "SCHEDULED",
        }
    }
}

// ==========================================
// AlertType / AlertSeverity - 告警
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    LowStock,
    ProductionIssue,
    System,
}

impl AlertType {
    pub fn as_str(&self) -> &str {
        match self {
            AlertType::LowStock => "LOW_STOCK",
            AlertType::ProductionIssue => "PRODUCTION_ISSUE",
            AlertType::System => "SYSTEM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(AlertSeverity::Low),
            "MEDIUM" => Some(AlertSeverity::Medium),
            "HIGH" => Some(AlertSeverity::High),
            "CRITICAL" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}
