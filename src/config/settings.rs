// ==========================================
// 仓储履约装箱系统 - 配置快照
// ==========================================
// 职责: 每次运行开始时一次性解析全部配置，运行期间只读
// ==========================================

use crate::config::fulfillment_config_trait::{ConfigResult, FulfillmentConfigReader};
use crate::domain::types::{MissingUppPolicy, PalletMode, PickupPolicy};
use crate::engine::routing_metrics::DEFAULT_HEAVY_WEIGHT_THRESHOLD_LBS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentSettings {
    pub pallet_mode: PalletMode,
    pub missing_upp_policy: MissingUppPolicy,
    pub pickup_policy: PickupPolicy,
    pub heavy_weight_threshold_lbs: f64,
    pub pickup_lead_business_days: u32,
    pub transit_buffer_business_days: u32,
    /// 0 = 不限
    pub pack_operation_budget: u32,
    /// 0 = 不限
    pub pack_time_budget_ms: u64,
    pub batch_max_workers: usize,
}

impl Default for FulfillmentSettings {
    fn default() -> Self {
        Self {
            pallet_mode: PalletMode::Grouped,
            missing_upp_policy: MissingUppPolicy::Exclude,
            pickup_policy: PickupPolicy::Window,
            heavy_weight_threshold_lbs: DEFAULT_HEAVY_WEIGHT_THRESHOLD_LBS,
            pickup_lead_business_days: 2,
            transit_buffer_business_days: 2,
            pack_operation_budget: 0,
            pack_time_budget_ms: 0,
            batch_max_workers: 4,
        }
    }
}

impl FulfillmentSettings {
    /// 从配置读取器解析快照
    pub async fn load<C>(reader: &C) -> ConfigResult<Self>
    where
        C: FulfillmentConfigReader + ?Sized,
    {
        Ok(Self {
            pallet_mode: reader.get_pallet_mode().await?,
            missing_upp_policy: reader.get_missing_upp_policy().await?,
            pickup_policy: reader.get_pickup_policy().await?,
            heavy_weight_threshold_lbs: reader.get_heavy_weight_threshold_lbs().await?,
            pickup_lead_business_days: reader.get_pickup_lead_business_days().await?,
            transit_buffer_business_days: reader.get_transit_buffer_business_days().await?,
            pack_operation_budget: reader.get_pack_operation_budget().await?,
            pack_time_budget_ms: reader.get_pack_time_budget_ms().await?,
            batch_max_workers: reader.get_batch_max_workers().await?,
        })
    }

    /// 装箱操作预算（None = 不限）
    pub fn operation_budget(&self) -> Option<u32> {
        (self.pack_operation_budget > 0).then_some(self.pack_operation_budget)
    }

    /// 装箱墙钟预算（None = 不限）
    pub fn time_budget(&self) -> Option<Duration> {
        (self.pack_time_budget_ms > 0).then(|| Duration::from_millis(self.pack_time_budget_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MockConfig {
        pallet_mode: PalletMode,
        budget: u32,
    }

    #[async_trait]
    impl FulfillmentConfigReader for MockConfig {
        async fn get_pallet_mode(&self) -> ConfigResult<PalletMode> {
            Ok(self.pallet_mode)
        }
        async fn get_missing_upp_policy(&self) -> ConfigResult<MissingUppPolicy> {
            Ok(MissingUppPolicy::DefaultToOne)
        }
        async fn get_pickup_policy(&self) -> ConfigResult<PickupPolicy> {
            Ok(PickupPolicy::Strict)
        }
        async fn get_heavy_weight_threshold_lbs(&self) -> ConfigResult<f64> {
            Ok(150.0)
        }
        async fn get_pickup_lead_business_days(&self) -> ConfigResult<u32> {
            Ok(3)
        }
        async fn get_transit_buffer_business_days(&self) -> ConfigResult<u32> {
            Ok(1)
        }
        async fn get_pack_operation_budget(&self) -> ConfigResult<u32> {
            Ok(self.budget)
        }
        async fn get_pack_time_budget_ms(&self) -> ConfigResult<u64> {
            Ok(0)
        }
        async fn get_batch_max_workers(&self) -> ConfigResult<usize> {
            Ok(2)
        }
    }

    #[tokio::test]
    async fn test_load_resolves_every_key() {
        let reader = MockConfig {
            pallet_mode: PalletMode::PerLine,
            budget: 10,
        };
        let settings = FulfillmentSettings::load(&reader).await.unwrap();

        assert_eq!(settings.pallet_mode, PalletMode::PerLine);
        assert_eq!(settings.missing_upp_policy, MissingUppPolicy::DefaultToOne);
        assert_eq!(settings.pickup_policy, PickupPolicy::Strict);
        assert_eq!(settings.heavy_weight_threshold_lbs, 150.0);
        assert_eq!(settings.pickup_lead_business_days, 3);
        assert_eq!(settings.transit_buffer_business_days, 1);
        assert_eq!(settings.operation_budget(), Some(10));
        assert_eq!(settings.time_budget(), None);
        assert_eq!(settings.batch_max_workers, 2);
    }

    #[test]
    fn test_zero_budget_means_unlimited() {
        let settings = FulfillmentSettings::default();
        assert_eq!(settings.operation_budget(), None);
        assert_eq!(settings.time_budget(), None);
        assert_eq!(settings.heavy_weight_threshold_lbs, 285.0);
    }
}
