// ==========================================
// 仓储履约装箱系统 - 履约API
// ==========================================
// 职责: 封装装箱/路由/批处理/续跑/导入/配置，供 CLI 调用
// 说明: 每次调用开始时读取一次配置快照，调用期间不变
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, FulfillmentSettings};
use crate::domain::issue::PackingIssue;
use crate::domain::types::{MissingUppPolicy, PalletMode, PickupPolicy};
use crate::engine::{
    BatchRunner, BatchSummary, BusinessDayCalendar, FulfillmentRepositories, PackingBudget,
    PackingOrchestrator, PackingReport, RoutingDecision, RoutingOrchestrator, RunContext,
    ShipmentRunResult,
};
use crate::importer::{PackRuleImportSummary, PackRuleImporter};

/// 履约API
pub struct FulfillmentApi {
    repositories: FulfillmentRepositories,
    config_manager: Arc<ConfigManager>,
    calendar: BusinessDayCalendar,
}

impl FulfillmentApi {
    pub fn new(repositories: FulfillmentRepositories, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            repositories,
            config_manager,
            calendar: BusinessDayCalendar::new(),
        }
    }

    /// 今天（按工作日日历规整：周末顺延到下周一）
    pub fn today(&self) -> NaiveDate {
        self.calendar.normalize(Local::now().naive_local()).date()
    }

    /// 读取配置快照
    pub async fn load_settings(&self) -> ApiResult<FulfillmentSettings> {
        FulfillmentSettings::load(self.config_manager.as_ref())
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    // ==========================================
    // 运行
    // ==========================================

    /// 批量装箱 + 路由
    ///
    /// # 参数
    /// - shipment_ids: 为空时处理库中全部发运单
    #[instrument(skip(self, shipment_ids), fields(requested = shipment_ids.len()))]
    pub async fn run_batch(&self, shipment_ids: Vec<String>) -> ApiResult<BatchSummary> {
        let settings = self.load_settings().await?;
        let shipment_ids = if shipment_ids.is_empty() {
            self.repositories.shipment_repo.list_shipment_ids()?
        } else {
            shipment_ids
        };
        if let Ok(snapshot) = self.config_manager.get_config_snapshot() {
            info!(config = %snapshot, "本次运行配置快照");
        }

        let runner = BatchRunner::new(self.repositories.collaborators(), &settings);
        let mut ctx = RunContext::new(self.today());
        Ok(runner.run(&mut ctx, shipment_ids).await)
    }

    /// 续跑挂起的发运单
    pub async fn resume_shipment(&self, shipment_id: &str) -> ApiResult<ShipmentRunResult> {
        let shipment_id = require_id(shipment_id)?;
        let settings = self.load_settings().await?;
        let runner = BatchRunner::new(self.repositories.collaborators(), &settings);
        Ok(runner.resume(shipment_id, self.today()).await)
    }

    /// 仅装箱（新运行）
    pub async fn pack_shipment(&self, shipment_id: &str) -> ApiResult<PackingReport> {
        let shipment_id = require_id(shipment_id)?;
        let settings = self.load_settings().await?;
        let orchestrator = PackingOrchestrator::new(
            self.repositories.collaborators(),
            PackingBudget::from_settings(&settings),
        );
        let run_id = uuid::Uuid::new_v4().to_string();
        Ok(orchestrator.pack_shipment(shipment_id, &run_id)?)
    }

    /// 仅路由
    pub async fn route_shipment(&self, shipment_id: &str) -> ApiResult<RoutingDecision> {
        let shipment_id = require_id(shipment_id)?;
        let settings = self.load_settings().await?;
        let orchestrator = RoutingOrchestrator::new(self.repositories.collaborators(), &settings);
        Ok(orchestrator.route_shipment(shipment_id, self.today())?)
    }

    pub fn list_issues(&self, shipment_id: &str) -> ApiResult<Vec<PackingIssue>> {
        Ok(self.repositories.issue_repo.list_by_shipment(shipment_id)?)
    }

    // ==========================================
    // 主数据 / 配置
    // ==========================================

    pub fn import_pack_rules(&self, file_path: &str) -> ApiResult<PackRuleImportSummary> {
        let importer = PackRuleImporter::new(self.repositories.pack_rule_repo.clone());
        Ok(importer.import_from_csv(file_path)?)
    }

    /// 写入配置（校验键和值）
    pub fn set_config(&self, key: &str, value: &str) -> ApiResult<()> {
        validate_config_value(key, value)?;
        self.config_manager
            .set_global_config_value(key, value.trim())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        info!(key, value, "配置已更新");
        Ok(())
    }
}

fn require_id(shipment_id: &str) -> ApiResult<&str> {
    let trimmed = shipment_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("shipment_id 不能为空".to_string()));
    }
    Ok(trimmed)
}

fn validate_config_value(key: &str, value: &str) -> ApiResult<()> {
    let value = value.trim();
    let invalid = || ApiError::InvalidInput(format!("配置 {} 的值无效: {}", key, value));
    match key {
        config_keys::PALLET_MODE => PalletMode::parse(value).map(|_| ()).ok_or_else(invalid),
        config_keys::MISSING_UPP_POLICY => MissingUppPolicy::parse(value).map(|_| ()).ok_or_else(invalid),
        config_keys::PICKUP_POLICY => PickupPolicy::parse(value).map(|_| ()).ok_or_else(invalid),
        config_keys::HEAVY_WEIGHT_THRESHOLD_LBS => match value.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(()),
            _ => Err(invalid()),
        },
        config_keys::PICKUP_LEAD_BUSINESS_DAYS
        | config_keys::TRANSIT_BUFFER_BUSINESS_DAYS
        | config_keys::PACK_OPERATION_BUDGET => value.parse::<u32>().map(|_| ()).map_err(|_| invalid()),
        config_keys::PACK_TIME_BUDGET_MS => value.parse::<u64>().map(|_| ()).map_err(|_| invalid()),
        config_keys::BATCH_MAX_WORKERS => match value.parse::<usize>() {
            Ok(v) if v > 0 => Ok(()),
            _ => Err(invalid()),
        },
        _ => Err(ApiError::InvalidInput(format!("未知配置项: {}", key))),
    }
}
