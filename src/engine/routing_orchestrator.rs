// ==========================================
// 仓储履约装箱系统 - 路由编排器
// ==========================================
// 职责: 汇总箱数/体积/重量/托盘数，确定申请类型与提货日期，判定 READY/BLOCKED
// 输入: 发运单 + 明细行（UPP 按行值或仓库配置解析）+ 今天
// 输出: RoutingDecision，并回写发运单字段、上报问题
// ==========================================
// 红线: 提货日期已确定 + 无托盘数据缺失 + 无箱重缺失 才能 READY
// 红线: 每个阻断条件一条原因，合并为一条消息
// 红线: 指标每次整体重算并覆盖旧值
// ==========================================

use crate::config::FulfillmentSettings;
use crate::domain::issue::{combine_issue_messages, PackingIssue};
use crate::domain::routing::{PalletGroup, RoutingMetrics, ShipmentFieldUpdate};
use crate::domain::shipment::{Shipment, ShipmentLine};
use crate::domain::types::{IssueKind, RoutingStatus};
use crate::engine::collaborators::FulfillmentCollaborators;
use crate::engine::error::EngineResult;
use crate::engine::pallet_share::PalletShareCalculator;
use crate::engine::pickup_scheduler::PickupScheduler;
use crate::engine::routing_metrics::RoutingMetricsCalculator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// 单个发运单的路由判定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub shipment_id: String,
    pub metrics: RoutingMetrics,
    pub status: RoutingStatus,
    pub pallet_groups: Vec<PalletGroup>,
    pub issues: Vec<PackingIssue>,
    /// 合并后的阻断原因（READY 时为空）
    pub issue_text: Option<String>,
}

impl RoutingDecision {
    pub fn is_ready(&self) -> bool {
        self.status == RoutingStatus::Ready
    }
}

pub struct RoutingOrchestrator {
    collaborators: FulfillmentCollaborators,
    metrics: RoutingMetricsCalculator,
    pallets: PalletShareCalculator,
    pickup: PickupScheduler,
}

impl RoutingOrchestrator {
    pub fn new(collaborators: FulfillmentCollaborators, settings: &FulfillmentSettings) -> Self {
        Self {
            collaborators,
            metrics: RoutingMetricsCalculator::new(settings.heavy_weight_threshold_lbs),
            pallets: PalletShareCalculator::new(settings.pallet_mode, settings.missing_upp_policy),
            pickup: PickupScheduler::new(
                settings.pickup_policy,
                settings.pickup_lead_business_days,
                settings.transit_buffer_business_days,
            ),
        }
    }

    /// 计算并回写一个发运单的路由信息
    #[instrument(skip(self))]
    pub fn route_shipment(&self, shipment_id: &str, today: NaiveDate) -> EngineResult<RoutingDecision> {
        let shipment = self.collaborators.shipments.read_shipment(shipment_id)?;
        let mut lines = self.collaborators.shipments.read_shipment_lines(shipment_id)?;
        self.resolve_units_per_pallet(&shipment, &mut lines)?;

        let totals = self.metrics.compute_totals(&lines);
        let pallets = self.pallets.compute_pallets(&lines);
        let request_type = self.metrics.request_type(totals.total_weight);

        let mut issues = Vec::new();

        for (line_id, item_id) in &pallets.missing_upp_lines {
            issues.push(PackingIssue::line(
                IssueKind::MissingUnitsPerPallet,
                shipment_id,
                line_id,
                item_id,
                format!("物料 {} 缺少每托盘件数", item_id),
            ));
        }
        for (line_id, item_id) in &totals.missing_weight_lines {
            issues.push(PackingIssue::line(
                IssueKind::MissingCartonWeight,
                shipment_id,
                line_id,
                item_id,
                format!("物料 {} 缺少箱重，按 0 计算", item_id),
            ));
        }

        let pickup_date = match self.pickup.resolve(shipment.mabd, today) {
            Ok(date) => Some(date),
            Err(rejection) => {
                issues.push(PackingIssue::shipment(
                    IssueKind::PickupDateUnresolved,
                    shipment_id,
                    rejection.to_string(),
                ));
                None
            }
        };

        let status = if issues.is_empty() {
            RoutingStatus::Ready
        } else {
            RoutingStatus::Blocked
        };
        let issue_text = combine_issue_messages(&issues);

        let metrics = RoutingMetrics {
            total_cartons: totals.total_cartons,
            total_volume: totals.total_volume,
            total_weight: totals.total_weight,
            total_pallets: pallets.total_pallets,
            request_type,
            pickup_date,
        };

        let update = ShipmentFieldUpdate::from_metrics(&metrics, status, issue_text.clone());
        self.collaborators
            .shipment_writer
            .update_shipment_fields(shipment_id, &update)?;

        for issue in &issues {
            warn!(kind = %issue.kind, message = %issue.message, "路由阻断原因");
            self.collaborators.issues.report_issue(issue)?;
        }

        info!(
            %status,
            cartons = metrics.total_cartons,
            weight = metrics.total_weight,
            pallets = metrics.total_pallets,
            request_type = request_type.code(),
            pickup_date = ?metrics.pickup_date,
            "路由计算完成"
        );

        Ok(RoutingDecision {
            shipment_id: shipment_id.to_string(),
            metrics,
            status,
            pallet_groups: pallets.groups,
            issues,
            issue_text,
        })
    }

    /// 行上 UPP 无效时按仓库配置补齐
    fn resolve_units_per_pallet(&self, shipment: &Shipment, lines: &mut [ShipmentLine]) -> EngineResult<()> {
        for line in lines.iter_mut() {
            if line.valid_units_per_pallet().is_some() {
                continue;
            }
            line.units_per_pallet = self
                .collaborators
                .pallet_config
                .read_location_pallet_config(&shipment.location_id, &line.item_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{MissingUppPolicy, PalletMode, RequestType};
    use crate::repository::memory_store::MemoryStore;
    use std::sync::Arc;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn line(line_id: &str, item_id: &str, qty: u32, upp: Option<u32>) -> ShipmentLine {
        let mut l = ShipmentLine::new(line_id, item_id, qty);
        l.units_per_carton = Some(10);
        l.weight_per_carton = Some(2.0);
        l.cubic_feet_per_carton = Some(1.0);
        l.units_per_pallet = upp;
        l
    }

    fn setup(lines: Vec<ShipmentLine>, mabd: Option<NaiveDate>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_shipment(
                Shipment {
                    shipment_id: "S1".to_string(),
                    customer_id: None,
                    location_id: "WH1".to_string(),
                    mabd,
                },
                lines,
            )
            .unwrap();
        store.register_location("WH1").unwrap();
        store
    }

    fn orchestrator(store: &Arc<MemoryStore>) -> RoutingOrchestrator {
        RoutingOrchestrator::new(
            FulfillmentCollaborators::from_store(store.clone()),
            &FulfillmentSettings::default(),
        )
    }

    #[test]
    fn test_ready_shipment_writes_metrics() {
        let store = setup(vec![line("L1", "A", 25, Some(100))], Some(d(10, 30)));

        let decision = orchestrator(&store).route_shipment("S1", d(10, 12)).unwrap();

        assert!(decision.is_ready());
        assert_eq!(decision.metrics.total_cartons, 3);
        assert!((decision.metrics.total_weight - 6.0).abs() < 1e-9);
        assert!((decision.metrics.total_volume - 3.0).abs() < 1e-9);
        assert_eq!(decision.metrics.total_pallets, 1);
        assert_eq!(decision.metrics.request_type, RequestType::Standard);
        assert_eq!(decision.metrics.pickup_date, Some(d(10, 27)));
        assert!(decision.issue_text.is_none());

        let update = store.field_update("S1").unwrap().expect("应回写发运单");
        assert_eq!(update.routing_status, RoutingStatus::Ready);
        assert_eq!(update.pallet_count, 1);
    }

    #[test]
    fn test_location_config_fills_missing_line_upp() {
        let store = setup(vec![line("L1", "A", 30, None)], Some(d(10, 30)));
        store.set_location_pallet("WH1", "A", 20).unwrap();

        let decision = orchestrator(&store).route_shipment("S1", d(10, 12)).unwrap();

        assert!(decision.is_ready());
        assert_eq!(decision.metrics.total_pallets, 2);
    }

    #[test]
    fn test_unrecognized_location_defaults_upp_to_one() {
        let store = setup(vec![line("L1", "A", 3, None)], Some(d(10, 30)));
        store
            .insert_shipment(
                Shipment {
                    shipment_id: "S1".to_string(),
                    customer_id: None,
                    location_id: "UNKNOWN".to_string(),
                    mabd: Some(d(10, 30)),
                },
                vec![line("L1", "A", 3, None)],
            )
            .unwrap();

        let decision = orchestrator(&store).route_shipment("S1", d(10, 12)).unwrap();

        assert!(decision.is_ready());
        assert_eq!(decision.metrics.total_pallets, 3);
    }

    #[test]
    fn test_one_missing_upp_blocks_naming_only_that_item() {
        let store = setup(
            vec![
                line("L1", "A", 5, Some(10)),
                line("L2", "B", 5, None),
                line("L3", "C", 5, Some(10)),
            ],
            Some(d(10, 30)),
        );

        let decision = orchestrator(&store).route_shipment("S1", d(10, 12)).unwrap();

        assert_eq!(decision.status, RoutingStatus::Blocked);
        assert_eq!(decision.issues.len(), 1);
        assert_eq!(decision.issues[0].kind, IssueKind::MissingUnitsPerPallet);
        let text = decision.issue_text.expect("应有阻断原因");
        assert!(text.contains("物料 B"));
        assert!(!text.contains("物料 A"));
        assert!(!text.contains("物料 C"));
        // 其余两行仍共享托盘
        assert_eq!(decision.metrics.total_pallets, 1);
        assert_eq!(store.issues().unwrap().len(), 1);
    }

    #[test]
    fn test_multiple_reasons_are_combined() {
        let mut no_weight = line("L2", "B", 5, Some(10));
        no_weight.weight_per_carton = None;
        let store = setup(vec![line("L1", "A", 5, None), no_weight], None);

        let decision = orchestrator(&store).route_shipment("S1", d(10, 12)).unwrap();

        assert_eq!(decision.status, RoutingStatus::Blocked);
        let kinds: Vec<IssueKind> = decision.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::MissingUnitsPerPallet,
                IssueKind::MissingCartonWeight,
                IssueKind::PickupDateUnresolved
            ]
        );
        let update = store.field_update("S1").unwrap().unwrap();
        assert_eq!(update.routing_status, RoutingStatus::Blocked);
        assert_eq!(update.pickup_date, None);
        assert_eq!(update.issue_text.unwrap().matches("; ").count(), 2);
    }

    #[test]
    fn test_heavy_shipment_uses_request_type_one() {
        let mut heavy = line("L1", "A", 100, Some(100));
        heavy.weight_per_carton = Some(30.0);
        let store = setup(vec![heavy], Some(d(10, 30)));

        let decision = orchestrator(&store).route_shipment("S1", d(10, 12)).unwrap();

        assert!((decision.metrics.total_weight - 300.0).abs() < 1e-9);
        assert_eq!(decision.metrics.request_type, RequestType::Heavy);
    }

    #[test]
    fn test_per_line_mode_with_default_to_one() {
        let store = setup(
            vec![line("L1", "A", 5, Some(10)), line("L2", "B", 2, None)],
            Some(d(10, 30)),
        );
        let settings = FulfillmentSettings {
            pallet_mode: PalletMode::PerLine,
            missing_upp_policy: MissingUppPolicy::DefaultToOne,
            ..FulfillmentSettings::default()
        };
        let orch = RoutingOrchestrator::new(FulfillmentCollaborators::from_store(store.clone()), &settings);

        let decision = orch.route_shipment("S1", d(10, 12)).unwrap();

        // 0.5 + 2/1 = 2.5 → 3；缺失 UPP 仍阻断
        assert_eq!(decision.metrics.total_pallets, 3);
        assert_eq!(decision.status, RoutingStatus::Blocked);
    }
}
