// ==========================================
// FulfillmentApi 集成测试
// ==========================================
// 测试目标: 经由 AppState 组装后的导入 → 配置 → 批处理 → 续跑
// ==========================================


use fulfillment_pack::api::ApiError;
use fulfillment_pack::app::AppState;
use fulfillment_pack::config::config_keys;
use fulfillment_pack::domain::types::IssueKind;
use fulfillment_pack::engine::{PackageStore, ShipmentRunStatus};
use std::io::Write;
use test_helpers::*;

fn write_rules_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create csv");
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_import_rules_then_run_all_shipments() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).expect("AppState should initialize");
    let api = state.fulfillment_api.clone();

    let csv = write_rules_csv(
        "item_id,threshold_quantity,package_type_id,fixed_weight\n\
         ITEM-A,12,BOX12,1.0\n\
         ITEM-A,24,BOX24,2.0\n\
         ITEM-B,0,BOX1,1.0\n",
    );
    let summary = api
        .import_pack_rules(csv.path().to_str().unwrap())
        .expect("import should succeed");
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.rejected.len(), 1);

    state
        .repositories
        .shipment_repo
        .upsert_shipment(
            &shipment("S1", None, "WH1", None),
            &[line("L1", "ITEM-A", 36, 12, 6.0, Some(36))],
        )
        .unwrap();
    state
        .repositories
        .shipment_repo
        .upsert_shipment(
            &shipment("S2", None, "WH1", None),
            &[line("L1", "ITEM-B", 5, 5, 2.0, Some(5))],
        )
        .unwrap();

    let batch = api.run_batch(Vec::new()).await.expect("batch should run");
    assert_eq!(batch.results.len(), 2);
    assert_eq!(batch.count(ShipmentRunStatus::Completed), 2);

    let s1 = batch.result_for("S1").unwrap();
    assert_eq!(s1.packing.as_ref().map(|p| p.packages_created), Some(2));

    let issues = api.list_issues("S2").unwrap();
    assert!(issues.iter().any(|i| i.kind == IssueKind::NoRulesFound));
    // 无 MABD 时提货日期无法确定
    assert!(issues.iter().any(|i| i.kind == IssueKind::PickupDateUnresolved));
}

#[tokio::test]
async fn test_budget_config_suspends_and_resume_completes() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).unwrap();
    let api = state.fulfillment_api.clone();

    state
        .repositories
        .pack_rule_repo
        .upsert_rules(&standard_rules("ITEM-A"))
        .unwrap();
    state
        .repositories
        .shipment_repo
        .upsert_shipment(
            &shipment("S1", None, "WH1", None),
            &[
                line("L1", "ITEM-A", 48, 12, 6.0, Some(48)),
                line("L2", "ITEM-A", 48, 12, 6.0, Some(48)),
            ],
        )
        .unwrap();

    api.set_config(config_keys::PACK_OPERATION_BUDGET, "2").unwrap();
    let batch = api.run_batch(vec!["S1".to_string()]).await.unwrap();
    assert_eq!(batch.results[0].status, ShipmentRunStatus::Suspended);
    assert!(batch.results[0].routing.is_none());

    api.set_config(config_keys::PACK_OPERATION_BUDGET, "0").unwrap();
    let resumed = api.resume_shipment("S1").await.unwrap();
    assert_eq!(resumed.status, ShipmentRunStatus::Completed);
    assert!(resumed.packing.as_ref().map(|p| p.resumed).unwrap_or(false));
    assert!(resumed.routing.is_some());

    let packages = state.repositories.package_repo.list_packages("S1").unwrap();
    assert_eq!(packages.len(), 4);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).unwrap();
    let api = state.fulfillment_api.clone();

    assert!(matches!(
        api.set_config(config_keys::PALLET_MODE, "STACKED"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.set_config("unknown_key", "1"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.pack_shipment("  ").await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.route_shipment("S404").await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        api.import_pack_rules("/nonexistent/rules.csv"),
        Err(ApiError::NotFound(_))
    ));
}
