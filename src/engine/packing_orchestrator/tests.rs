use super::*;
use crate::domain::pack_rule::{Dimensions, PackRule};
use crate::domain::package::{Package, PackageContent};
use crate::domain::shipment::{CustomerPackingProfile, Shipment, ShipmentLine};
use crate::domain::types::IssueKind;
use crate::engine::collaborators::{CheckpointStore, FulfillmentCollaborators, PackageStore};
use crate::engine::error::EngineError;
use crate::repository::memory_store::MemoryStore;
use std::sync::Arc;

// ==========================================
// 测试辅助函数
// ==========================================

fn shipment(shipment_id: &str, customer_id: Option<&str>) -> Shipment {
    Shipment {
        shipment_id: shipment_id.to_string(),
        customer_id: customer_id.map(str::to_string),
        location_id: "WH1".to_string(),
        mabd: None,
    }
}

fn line(line_id: &str, item_id: &str, ordered: u32) -> ShipmentLine {
    let mut l = ShipmentLine::new(line_id, item_id, ordered);
    l.units_per_carton = Some(12);
    l.weight_per_carton = Some(6.0);
    l
}

fn setup(lines: Vec<ShipmentLine>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_shipment(shipment("S1", None), lines).unwrap();
    store
        .insert_rules(vec![
            PackRule::global("ITEM-A", 6, "BOX6", 0.5),
            PackRule::global("ITEM-A", 12, "BOX12", 0.5),
            PackRule::global("ITEM-A", 24, "BOX24", 0.5),
        ])
        .unwrap();
    store
}

fn orchestrator(store: &Arc<MemoryStore>, budget: PackingBudget) -> PackingOrchestrator {
    PackingOrchestrator::new(FulfillmentCollaborators::from_store(store.clone()), budget)
}

fn sequences(store: &MemoryStore) -> Vec<u32> {
    store
        .packages("S1")
        .unwrap()
        .iter()
        .map(|p| p.sequence_index)
        .collect()
}

fn committed_package(sequence_index: u32, line_id: &str, quantity: u32) -> Package {
    Package {
        package_id: None,
        shipment_id: "S1".to_string(),
        sequence_index,
        quantity,
        package_type_id: "BOX24".to_string(),
        weight: 0.0,
        dimensions: Dimensions::default(),
        contents: vec![PackageContent {
            line_id: line_id.to_string(),
            item_id: "ITEM-A".to_string(),
            quantity,
            lot_id: None,
        }],
    }
}

// ==========================================
// 基础流程
// ==========================================

#[test]
fn test_pack_shipment_persists_each_package_with_sequence() {
    let store = setup(vec![line("L1", "ITEM-A", 48), line("L2", "ITEM-A", 12)]);

    let report = orchestrator(&store, PackingBudget::unlimited())
        .pack_shipment("S1", "RUN-1")
        .unwrap();

    assert!(report.is_completed());
    assert!(!report.resumed);
    assert_eq!(report.packages_created, 3);
    assert_eq!(report.units_packed, 60);
    assert_eq!(report.package_ids.len(), 3);
    assert_eq!(sequences(&store), vec![1, 2, 3]);
    assert!(store.load_checkpoint("S1").unwrap().is_none());
}

#[test]
fn test_flagged_line_does_not_stop_other_lines() {
    let store = setup(vec![line("L1", "ITEM-X", 10), line("L2", "ITEM-A", 24)]);

    let report = orchestrator(&store, PackingBudget::unlimited())
        .pack_shipment("S1", "RUN-1")
        .unwrap();

    assert!(report.is_completed());
    assert_eq!(report.packages_created, 1);
    assert_eq!(report.partial_line_ids, vec!["L1".to_string()]);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::NoRulesFound);

    let reported = store.issues().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].item_id.as_deref(), Some("ITEM-X"));
}

#[test]
fn test_customer_profile_disallowing_partial_absorbs_remainder() {
    let store = setup(vec![line("L1", "ITEM-A", 104)]);
    store
        .insert_shipment(shipment("S1", Some("CUST-1")), vec![line("L1", "ITEM-A", 104)])
        .unwrap();
    store
        .insert_customer_profile(CustomerPackingProfile {
            customer_id: "CUST-1".to_string(),
            partial_pack_allowed: false,
            manual_partial_pack: false,
        })
        .unwrap();

    orchestrator(&store, PackingBudget::unlimited())
        .pack_shipment("S1", "RUN-1")
        .unwrap();

    let packages = store.packages("S1").unwrap();
    assert_eq!(packages.len(), 5);
    assert!(packages.iter().all(|p| p.package_type_id == "BOX24"));
    assert_eq!(packages[4].quantity, 8);
}

#[test]
fn test_unknown_shipment_is_an_error() {
    let store = setup(Vec::new());

    let err = orchestrator(&store, PackingBudget::unlimited())
        .pack_shipment("MISSING", "RUN-1")
        .unwrap_err();

    assert!(matches!(err, EngineError::Repository(_)));
}

// ==========================================
// 预算 / 断点 / 续跑
// ==========================================

#[test]
fn test_budget_suspends_between_lines_and_resume_completes() {
    // 每行 48 件 → 2 箱
    let store = setup(vec![
        line("L1", "ITEM-A", 48),
        line("L2", "ITEM-A", 48),
        line("L3", "ITEM-A", 48),
    ]);
    let orch = orchestrator(&store, PackingBudget::operations(3));

    let first = orch.pack_shipment("S1", "RUN-1").unwrap();
    assert_eq!(first.outcome, PackingOutcome::Suspended);
    assert_eq!(first.packages_created, 2);

    let checkpoint = store.load_checkpoint("S1").unwrap().expect("应写入断点");
    assert_eq!(checkpoint.cursor, 1);
    assert_eq!(checkpoint.packages_created, 2);
    assert_eq!(checkpoint.package_ids, first.package_ids);

    let second = orch.resume_shipment("S1").unwrap();
    assert!(second.resumed);
    assert_eq!(second.run_id, "RUN-1");
    assert_eq!(second.outcome, PackingOutcome::Suspended);
    assert_eq!(second.packages_created, 2);
    assert_eq!(store.load_checkpoint("S1").unwrap().unwrap().packages_created, 4);

    let third = orch.resume_shipment("S1").unwrap();
    assert!(third.is_completed());
    assert_eq!(third.packages_created, 2);

    // 不重复装箱、序号连续
    assert_eq!(sequences(&store), vec![1, 2, 3, 4, 5, 6]);
    let total: u32 = store.packages("S1").unwrap().iter().map(|p| p.quantity).sum();
    assert_eq!(total, 144);
    assert!(store.load_checkpoint("S1").unwrap().is_none());
}

#[test]
fn test_single_line_larger_than_fresh_budget_still_proceeds() {
    let store = setup(vec![line("L1", "ITEM-A", 72)]);

    let report = orchestrator(&store, PackingBudget::operations(1))
        .pack_shipment("S1", "RUN-1")
        .unwrap();

    assert!(report.is_completed());
    assert_eq!(report.packages_created, 3);
}

#[test]
fn test_resume_recomputes_packed_from_committed_packages_and_fills_gaps() {
    let store = setup(vec![line("L1", "ITEM-A", 48), line("L2", "ITEM-A", 24)]);
    // 上一次运行已提交: L1 的 24 件(序号 1) 和 L2 的 24 件(序号 3)，断点丢失
    store.create_package(&committed_package(1, "L1", 24)).unwrap();
    store.create_package(&committed_package(3, "L2", 24)).unwrap();

    let report = orchestrator(&store, PackingBudget::unlimited())
        .pack_shipment("S1", "RUN-2")
        .unwrap();

    assert!(report.is_completed());
    assert_eq!(report.packages_created, 1);
    assert_eq!(report.units_packed, 24);
    assert_eq!(sequences(&store), vec![1, 2, 3]);
}

#[test]
fn test_skipped_lines_are_not_reprocessed_on_resume() {
    let store = setup(vec![
        line("L1", "ITEM-X", 10),
        line("L2", "ITEM-A", 48),
        line("L3", "ITEM-A", 48),
    ]);
    let orch = orchestrator(&store, PackingBudget::operations(2));

    let first = orch.pack_shipment("S1", "RUN-1").unwrap();
    assert_eq!(first.outcome, PackingOutcome::Suspended);
    assert_eq!(first.partial_line_ids, vec!["L1".to_string()]);

    let second = orch.resume_shipment("S1").unwrap();
    assert!(second.is_completed());
    assert!(second.issues.is_empty());
    assert_eq!(second.partial_line_ids, vec!["L1".to_string()]);

    let no_rules = store
        .issues()
        .unwrap()
        .into_iter()
        .filter(|i| i.kind == IssueKind::NoRulesFound)
        .count();
    assert_eq!(no_rules, 1);
    assert_eq!(store.packages("S1").unwrap().len(), 4);
}

#[test]
fn test_stale_checkpoint_beyond_lines_is_rejected() {
    let store = setup(vec![line("L1", "ITEM-A", 12)]);
    let mut stale = crate::domain::checkpoint::PackingCheckpoint::new("S1", "RUN-OLD");
    stale.cursor = 5;
    store.save_checkpoint(&stale).unwrap();

    let err = orchestrator(&store, PackingBudget::unlimited())
        .resume_shipment("S1")
        .unwrap_err();
    assert!(matches!(err, EngineError::InconsistentData { .. }));
    assert!(store.packages("S1").unwrap().is_empty());
}

#[test]
fn test_repeat_runs_with_external_baseline_never_double_pack() {
    let mut plain = line("L1", "ITEM-A", 20);
    plain.packed_quantity = 10;
    let mut lotted = line("L2", "ITEM-A", 20);
    lotted.packed_quantity = 10;
    lotted.lots = vec![crate::domain::shipment::LotAssignment {
        lot_id: "LOT1".to_string(),
        picked_quantity: 20,
        packed_quantity: 10,
        expiration: None,
    }];
    let store = setup(vec![plain, lotted]);
    let orch = orchestrator(&store, PackingBudget::unlimited());

    let first = orch.pack_shipment("S1", "RUN-1").unwrap();
    assert!(first.is_completed());
    assert_eq!(first.units_packed, 20);

    let second = orch.pack_shipment("S1", "RUN-2").unwrap();
    assert!(second.is_completed());
    assert_eq!(second.packages_created, 0);
    assert_eq!(second.units_packed, 0);

    // 外部基线 10 + 本系统包裹 10 == 订购 20
    let packages = store.packages("S1").unwrap();
    let for_line = |line_id: &str| -> u32 { packages.iter().map(|p| p.quantity_for_line(line_id)).sum() };
    assert_eq!(for_line("L1"), 10);
    assert_eq!(for_line("L2"), 10);
    assert!(packages
        .iter()
        .filter(|p| p.quantity_for_line("L2") > 0)
        .all(|p| p.contents[0].lot_id.as_deref() == Some("LOT1")));
}
