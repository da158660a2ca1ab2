// ==========================================
// 制造运营管理系统 - 生产 API
// ==========================================
// 职责: 产线维护 / 班次生产记录录入 / 待排产任务入队 /
//       产线效率查询 / BOM 维护
// ==========================================

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::DataValidator;
use crate::domain::production::{
    LineEfficiency, NewProductionRecord, ProductionJob, ProductionLine, ProductionRecord,
};
use crate::domain::types::JobStatus;
use crate::repository::production_repo::ProductionRepository;

/// 效率统计的默认回溯窗口
const EFFICIENCY_WINDOW_DAYS: i64 = 1;

// ==========================================
// ProductionApi - 生产 API
// ==========================================

/// 生产API
///
/// 职责：
/// 1. 产线维护与查询
/// 2. 班次生产记录录入（含校验, 效率落库前推导）
/// 3. 待排产任务入队
/// 4. BOM 行维护
pub struct ProductionApi {
    production_repo: Arc<ProductionRepository>,
}

impl ProductionApi {
    pub fn new(production_repo: Arc<ProductionRepository>) -> Self {
        Self { production_repo }
    }

    // ==========================================
    // 产线
    // ==========================================

    /// 新增产线
    pub fn create_line(
        &self,
        name: &str,
        capacity_per_hour: i64,
        efficiency_target: f64,
        setup_cost: f64,
    ) -> ApiResult<i64> {
        DataValidator::validate_production_line(name, capacity_per_hour, efficiency_target, setup_cost)?;
        let line_id = self
            .production_repo
            .insert_line(name, capacity_per_hour, efficiency_target, setup_cost)?;
        info!(line_id, name, "产线已创建");
        Ok(line_id)
    }

    /// 查询启用中的产线
    pub fn list_lines(&self) -> ApiResult<Vec<ProductionLine>> {
        Ok(self.production_repo.find_active_lines()?)
    }

    /// 产线近期效率（百分比口径）
    pub fn line_efficiencies(&self, days: Option<i64>) -> ApiResult<Vec<LineEfficiency>> {
        let days = days.unwrap_or(EFFICIENCY_WINDOW_DAYS);
        if days <= 0 {
            return Err(ApiError::InvalidInput(format!("days 必须为正, 实际{}", days)));
        }
        Ok(self.production_repo.line_efficiencies(days)?)
    }

    // ==========================================
    // 班次生产记录
    // ==========================================

    /// 录入班次生产记录
    ///
    /// # 返回
    /// - Ok(i64): 记录 id
    /// - Err(ApiError): 校验失败 / 产线不存在
    pub fn record_production(&self, record: NewProductionRecord) -> ApiResult<i64> {
        DataValidator::validate_production_record(&record)?;

        let efficiency = record.efficiency();
        if efficiency > 1.5 {
            // 超计划 50% 以上多半是录入口径问题, 留痕但不拦截
            warn!(
                line_id = record.production_line_id,
                efficiency, "班次效率异常偏高"
            );
        }

        let record_id = self.production_repo.insert_record(&record)?;
        info!(
            record_id,
            line_id = record.production_line_id,
            efficiency,
            "生产记录已录入"
        );
        Ok(record_id)
    }

    /// 查询产线近 N 天的生产记录（新 -> 旧）
    pub fn records_since(&self, line_id: i64, days: i64) -> ApiResult<Vec<ProductionRecord>> {
        if days <= 0 {
            return Err(ApiError::InvalidInput(format!("days 必须为正, 实际{}", days)));
        }
        Ok(self.production_repo.records_since(line_id, days)?)
    }

    // ==========================================
    // 待排产任务
    // ==========================================

    /// 任务入队（状态 PENDING, 等待下一轮排程）
    pub fn enqueue_job(
        &self,
        product_id: &str,
        quantity: i64,
        priority: i64,
        due_date: Option<DateTime<Utc>>,
    ) -> ApiResult<i64> {
        let job = ProductionJob {
            id: 0,
            product_id: product_id.to_string(),
            quantity,
            priority,
            due_date,
            status: JobStatus::Pending,
        };
        DataValidator::validate_production_job(&job)?;

        let job_id = self
            .production_repo
            .insert_job(product_id, quantity, priority, due_date)?;
        info!(job_id, product_id, quantity, priority, "排产任务已入队");
        Ok(job_id)
    }

    /// 查询待排产任务
    pub fn pending_jobs(&self) -> ApiResult<Vec<ProductionJob>> {
        Ok(self.production_repo.pending_jobs()?)
    }

    // ==========================================
    // BOM
    // ==========================================

    /// 维护产线 BOM 行（单位产量对某物料的用量）
    pub fn set_bom_row(&self, line_id: i64, item_id: i64, qty_per_unit: f64) -> ApiResult<()> {
        if qty_per_unit < 0.0 || !qty_per_unit.is_finite() {
            return Err(ApiError::InvalidInput(format!(
                "字段qty_per_unit错误: 无效取值 {}",
                qty_per_unit
            )));
        }
        self.production_repo
            .upsert_bom_row(line_id, item_id, qty_per_unit)?;
        Ok(())
    }
}
