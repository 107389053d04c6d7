// ==========================================
// 仓储履约装箱系统 - 批处理运行
// ==========================================
// 职责: 一次运行处理多个发运单（装箱 → 路由）
// 并发: 发运单之间独立，按 max_workers 有界并行；单个发运单内串行
// 红线: 运行内去重集合由 RunContext 持有
// 红线: 单个发运单失败只标记该发运单，批次继续
// ==========================================

use crate::config::FulfillmentSettings;
use crate::domain::issue::PackingIssue;
use crate::domain::types::IssueKind;
use crate::engine::collaborators::FulfillmentCollaborators;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::packing_orchestrator::{
    PackingBudget, PackingOrchestrator, PackingOutcome, PackingReport,
};
use crate::engine::routing_orchestrator::{RoutingDecision, RoutingOrchestrator};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RunContext - 运行上下文
// ==========================================
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    today: NaiveDate,
    seen: HashSet<String>,
}

impl RunContext {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_run_id(&Uuid::new_v4().to_string(), today)
    }

    pub fn with_run_id(run_id: &str, today: NaiveDate) -> Self {
        Self {
            run_id: run_id.to_string(),
            today,
            seen: HashSet::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// 登记发运单；本次运行已处理过返回 false
    pub fn admit(&mut self, shipment_id: &str) -> bool {
        self.seen.insert(shipment_id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentRunStatus {
    Completed, // 装箱完成且已路由
    Suspended, // 装箱预算耗尽，待续跑
    Failed,    // 计算异常，已标记失败
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRunResult {
    pub shipment_id: String,
    pub status: ShipmentRunStatus,
    pub packing: Option<PackingReport>,
    pub routing: Option<RoutingDecision>,
    pub error: Option<String>,
}

impl ShipmentRunResult {
    fn failed(shipment_id: &str, reason: String) -> Self {
        Self {
            shipment_id: shipment_id.to_string(),
            status: ShipmentRunStatus::Failed,
            packing: None,
            routing: None,
            error: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: String,
    /// 与输入顺序一致（已去重）
    pub results: Vec<ShipmentRunResult>,
    pub duplicates_skipped: usize,
}

impl BatchSummary {
    pub fn count(&self, status: ShipmentRunStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn result_for(&self, shipment_id: &str) -> Option<&ShipmentRunResult> {
        self.results.iter().find(|r| r.shipment_id == shipment_id)
    }
}

// ==========================================
// BatchRunner - 批处理执行器
// ==========================================
pub struct BatchRunner {
    collaborators: FulfillmentCollaborators,
    packing: Arc<PackingOrchestrator>,
    routing: Arc<RoutingOrchestrator>,
    max_workers: usize,
}

impl BatchRunner {
    pub fn new(collaborators: FulfillmentCollaborators, settings: &FulfillmentSettings) -> Self {
        Self {
            packing: Arc::new(PackingOrchestrator::new(
                collaborators.clone(),
                PackingBudget::from_settings(settings),
            )),
            routing: Arc::new(RoutingOrchestrator::new(collaborators.clone(), settings)),
            max_workers: settings.batch_max_workers.max(1),
            collaborators,
        }
    }

    /// 处理一批发运单
    #[instrument(skip(self, ctx, shipment_ids), fields(run_id = %ctx.run_id(), requested = shipment_ids.len()))]
    pub async fn run(&self, ctx: &mut RunContext, shipment_ids: Vec<String>) -> BatchSummary {
        let mut admitted = Vec::with_capacity(shipment_ids.len());
        let mut duplicates_skipped = 0;
        for shipment_id in shipment_ids {
            if ctx.admit(&shipment_id) {
                admitted.push(shipment_id);
            } else {
                duplicates_skipped += 1;
            }
        }
        if duplicates_skipped > 0 {
            warn!(duplicates_skipped, "本次运行内重复的发运单已跳过");
        }

        let run_id = ctx.run_id().to_string();
        let today = ctx.today();

        let mut indexed: Vec<(usize, ShipmentRunResult)> = stream::iter(admitted.into_iter().enumerate())
            .map(|(idx, shipment_id)| {
                let packing = Arc::clone(&self.packing);
                let routing = Arc::clone(&self.routing);
                let run_id = run_id.clone();
                async move {
                    let sid = shipment_id.clone();
                    let joined = tokio::task::spawn_blocking(move || {
                        Self::process_shipment(&packing, &routing, &sid, &run_id, today)
                    })
                    .await;
                    let outcome = match joined {
                        Ok(result) => result,
                        Err(join_err) => Err(EngineError::from(join_err)),
                    };
                    (idx, shipment_id, outcome)
                }
            })
            .buffer_unordered(self.max_workers)
            .map(|(idx, shipment_id, outcome)| {
                let result = match outcome {
                    Ok(result) => result,
                    Err(err) => self.fail_shipment(&shipment_id, &err),
                };
                (idx, result)
            })
            .collect()
            .await;

        indexed.sort_by_key(|(idx, _)| *idx);
        let summary = BatchSummary {
            run_id,
            results: indexed.into_iter().map(|(_, r)| r).collect(),
            duplicates_skipped,
        };

        info!(
            completed = summary.count(ShipmentRunStatus::Completed),
            suspended = summary.count(ShipmentRunStatus::Suspended),
            failed = summary.count(ShipmentRunStatus::Failed),
            "批处理完成"
        );
        summary
    }

    /// 续跑单个挂起的发运单（沿用断点 run_id），装箱完成后路由
    #[instrument(skip(self))]
    pub async fn resume(&self, shipment_id: &str, today: NaiveDate) -> ShipmentRunResult {
        let packing = Arc::clone(&self.packing);
        let routing = Arc::clone(&self.routing);
        let sid = shipment_id.to_string();
        let joined = tokio::task::spawn_blocking(move || {
            let report = packing.resume_shipment(&sid)?;
            Self::route_after_packing(&routing, &sid, report, today)
        })
        .await;

        let outcome = match joined {
            Ok(result) => result,
            Err(join_err) => Err(EngineError::from(join_err)),
        };
        match outcome {
            Ok(result) => result,
            Err(err) => self.fail_shipment(shipment_id, &err),
        }
    }

    /// 单个发运单: 装箱（可能挂起）→ 装箱完成后路由
    fn process_shipment(
        packing: &PackingOrchestrator,
        routing: &RoutingOrchestrator,
        shipment_id: &str,
        run_id: &str,
        today: NaiveDate,
    ) -> EngineResult<ShipmentRunResult> {
        let report = packing.pack_shipment(shipment_id, run_id)?;
        Self::route_after_packing(routing, shipment_id, report, today)
    }

    fn route_after_packing(
        routing: &RoutingOrchestrator,
        shipment_id: &str,
        report: PackingReport,
        today: NaiveDate,
    ) -> EngineResult<ShipmentRunResult> {
        if report.outcome == PackingOutcome::Suspended {
            return Ok(ShipmentRunResult {
                shipment_id: shipment_id.to_string(),
                status: ShipmentRunStatus::Suspended,
                packing: Some(report),
                routing: None,
                error: None,
            });
        }

        let decision = routing.route_shipment(shipment_id, today)?;
        Ok(ShipmentRunResult {
            shipment_id: shipment_id.to_string(),
            status: ShipmentRunStatus::Completed,
            packing: Some(report),
            routing: Some(decision),
            error: None,
        })
    }

    /// 标记失败并上报；标记本身失败只记录日志
    fn fail_shipment(&self, shipment_id: &str, err: &EngineError) -> ShipmentRunResult {
        let reason = err.to_string();
        error!(shipment_id, error = %reason, "发运单计算失败");

        if let Err(e) = self.collaborators.shipment_writer.mark_failed(shipment_id, &reason) {
            error!(shipment_id, error = %e, "标记发运单失败状态时出错");
        }
        let issue = PackingIssue::shipment(IssueKind::ComputationFailed, shipment_id, reason.clone());
        if let Err(e) = self.collaborators.issues.report_issue(&issue) {
            error!(shipment_id, error = %e, "上报计算失败问题时出错");
        }

        ShipmentRunResult::failed(shipment_id, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pack_rule::PackRule;
    use crate::domain::shipment::{Shipment, ShipmentLine};
    use crate::domain::types::RoutingStatus;
    use crate::repository::memory_store::MemoryStore;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn add_shipment(store: &MemoryStore, shipment_id: &str) {
        let mut line = ShipmentLine::new("L1", "ITEM-A", 24);
        line.units_per_carton = Some(12);
        line.weight_per_carton = Some(6.0);
        line.cubic_feet_per_carton = Some(1.0);
        line.units_per_pallet = Some(48);
        store
            .insert_shipment(
                Shipment {
                    shipment_id: shipment_id.to_string(),
                    customer_id: None,
                    location_id: "WH1".to_string(),
                    mabd: Some(d(10, 30)),
                },
                vec![line],
            )
            .unwrap();
    }

    fn setup() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_rules(vec![PackRule::global("ITEM-A", 12, "BOX12", 0.5)])
            .unwrap();
        store
    }

    #[test]
    fn test_run_context_dedups_within_run() {
        let mut ctx = RunContext::new(d(10, 12));
        assert!(ctx.admit("S1"));
        assert!(!ctx.admit("S1"));
        assert!(ctx.admit("S2"));
        assert!(Uuid::parse_str(ctx.run_id()).is_ok());
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_keeps_order() {
        let store = setup();
        add_shipment(&store, "S1");
        add_shipment(&store, "S3");
        let runner = BatchRunner::new(
            FulfillmentCollaborators::from_store(store.clone()),
            &FulfillmentSettings::default(),
        );
        let mut ctx = RunContext::with_run_id("RUN-1", d(10, 12));

        let summary = runner
            .run(
                &mut ctx,
                vec!["S1".to_string(), "S2".to_string(), "S3".to_string(), "S1".to_string()],
            )
            .await;

        assert_eq!(summary.run_id, "RUN-1");
        assert_eq!(summary.duplicates_skipped, 1);
        let order: Vec<&str> = summary.results.iter().map(|r| r.shipment_id.as_str()).collect();
        assert_eq!(order, vec!["S1", "S2", "S3"]);
        assert_eq!(summary.count(ShipmentRunStatus::Completed), 2);
        assert_eq!(summary.count(ShipmentRunStatus::Failed), 1);

        assert!(store.failure("S2").unwrap().is_some());
        assert!(store.failure("S1").unwrap().is_none());
        assert!(store
            .issues()
            .unwrap()
            .iter()
            .any(|i| i.kind == IssueKind::ComputationFailed && i.shipment_id == "S2"));

        let routed = summary.result_for("S1").and_then(|r| r.routing.as_ref()).unwrap();
        assert!(routed.is_ready());
        assert_eq!(store.packages("S3").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_suspended_shipment_is_not_routed() {
        let store = setup();
        let mut line = ShipmentLine::new("L1", "ITEM-A", 24);
        line.units_per_pallet = Some(48);
        let mut second = ShipmentLine::new("L2", "ITEM-A", 24);
        second.units_per_pallet = Some(48);
        store
            .insert_shipment(
                Shipment {
                    shipment_id: "S1".to_string(),
                    customer_id: None,
                    location_id: "WH1".to_string(),
                    mabd: Some(d(10, 30)),
                },
                vec![line, second],
            )
            .unwrap();
        let settings = FulfillmentSettings {
            pack_operation_budget: 2,
            ..FulfillmentSettings::default()
        };
        let runner = BatchRunner::new(FulfillmentCollaborators::from_store(store.clone()), &settings);

        let summary = runner
            .run(&mut RunContext::new(d(10, 12)), vec!["S1".to_string()])
            .await;

        assert_eq!(summary.count(ShipmentRunStatus::Suspended), 1);
        assert!(store.field_update("S1").unwrap().is_none());

        let resumed = runner.resume("S1", d(10, 12)).await;
        assert_eq!(resumed.status, ShipmentRunStatus::Completed);
        assert!(resumed.packing.as_ref().map(|p| p.resumed).unwrap_or(false));
        assert_eq!(store.packages("S1").unwrap().len(), 4);
        // 缺少箱重 → 路由阻断
        let decision = resumed.routing.unwrap();
        assert_eq!(decision.status, RoutingStatus::Blocked);
        assert!(store.field_update("S1").unwrap().is_some());
    }
}
