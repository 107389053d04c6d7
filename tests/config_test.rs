// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证 config_kv 读取、默认值回落与快照
// ==========================================


use fulfillment_pack::config::{config_keys, ConfigManager, FulfillmentConfigReader, FulfillmentSettings};
use fulfillment_pack::domain::types::{MissingUppPolicy, PalletMode, PickupPolicy};
use std::time::Duration;
use test_helpers::create_test_db;

#[tokio::test]
async fn test_empty_store_yields_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("ConfigManager should be created");

    let settings = FulfillmentSettings::load(&config_manager).await.unwrap();
    assert_eq!(settings, FulfillmentSettings::default());
    assert_eq!(settings.pallet_mode, PalletMode::Grouped);
    assert_eq!(settings.missing_upp_policy, MissingUppPolicy::Exclude);
    assert_eq!(settings.pickup_policy, PickupPolicy::Window);
}

#[tokio::test]
async fn test_overrides_are_picked_up() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_global_config_value(config_keys::PALLET_MODE, "PER_LINE")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::PICKUP_POLICY, "STRICT")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::PACK_OPERATION_BUDGET, "5")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::PACK_TIME_BUDGET_MS, "250")
        .unwrap();

    let settings = FulfillmentSettings::load(&config_manager).await.unwrap();
    assert_eq!(settings.pallet_mode, PalletMode::PerLine);
    assert_eq!(settings.pickup_policy, PickupPolicy::Strict);
    assert_eq!(settings.operation_budget(), Some(5));
    assert_eq!(settings.time_budget(), Some(Duration::from_millis(250)));

    // 覆写后再次写入同一键
    config_manager
        .set_global_config_value(config_keys::PACK_OPERATION_BUDGET, "0")
        .unwrap();
    assert_eq!(config_manager.get_pack_operation_budget().await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_global_config_value(config_keys::HEAVY_WEIGHT_THRESHOLD_LBS, "heavy")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::PALLET_MODE, "STACKED")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::BATCH_MAX_WORKERS, "0")
        .unwrap();

    assert_eq!(config_manager.get_heavy_weight_threshold_lbs().await.unwrap(), 285.0);
    assert_eq!(config_manager.get_pallet_mode().await.unwrap(), PalletMode::Grouped);
    assert_eq!(config_manager.get_batch_max_workers().await.unwrap(), 1);
}

#[tokio::test]
async fn test_config_snapshot_lists_global_keys() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_global_config_value(config_keys::MISSING_UPP_POLICY, "DEFAULT_TO_ONE")
        .unwrap();

    let snapshot = config_manager.get_config_snapshot().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(parsed[config_keys::MISSING_UPP_POLICY], "DEFAULT_TO_ONE");
    assert_eq!(
        config_manager.get_missing_upp_policy().await.unwrap(),
        MissingUppPolicy::DefaultToOne
    );
}
