// ==========================================
// 制造运营管理系统 - 告警 API
// ==========================================
// 职责: 未解决告警查询与人工解决
// 告警产生在库存变更事务与优化引擎内部, 不经过本层
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::validator::DataValidator;
use crate::domain::allocation::NewAlert;
use crate::repository::alert_repo::{AlertRepository, AlertView};

pub struct AlertApi {
    alert_repo: Arc<AlertRepository>,
}

impl AlertApi {
    pub fn new(alert_repo: Arc<AlertRepository>) -> Self {
        Self { alert_repo }
    }

    /// 人工发布告警（同源未解决告警去重, 重复时返回 false）
    pub fn raise(&self, alert: NewAlert) -> ApiResult<bool> {
        DataValidator::validate_alert(&alert.title, &alert.message)?;
        let created = self.alert_repo.raise(&alert)?;
        if created {
            info!(alert_type = alert.alert_type.as_str(), "告警已发布");
        }
        Ok(created)
    }

    /// 查询未解决告警（新 -> 旧）
    pub fn open_alerts(&self) -> ApiResult<Vec<AlertView>> {
        Ok(self.alert_repo.open_alerts()?)
    }

    /// 标记告警已解决
    pub fn resolve(&self, alert_id: i64) -> ApiResult<()> {
        self.alert_repo.resolve(alert_id)?;
        info!(alert_id, "告警已解决");
        Ok(())
    }
}
