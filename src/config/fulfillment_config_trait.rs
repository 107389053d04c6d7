// ==========================================
// 仓储履约装箱系统 - 履约配置读取 Trait
// ==========================================
// 职责: 定义编排器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{MissingUppPolicy, PalletMode, PickupPolicy};
use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// FulfillmentConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait FulfillmentConfigReader: Send + Sync {
    // ===== 托盘计算 =====

    /// 托盘模式
    ///
    /// # 默认值
    /// - GROUPED
    async fn get_pallet_mode(&self) -> ConfigResult<PalletMode>;

    /// 缺失 UPP 处理策略
    ///
    /// # 默认值
    /// - EXCLUDE
    async fn get_missing_upp_policy(&self) -> ConfigResult<MissingUppPolicy>;

    // ===== 路由 =====

    /// 提货日期策略
    ///
    /// # 默认值
    /// - WINDOW
    async fn get_pickup_policy(&self) -> ConfigResult<PickupPolicy>;

    /// 重货阈值 (lbs)，总重严格大于该值为申请类型 1
    ///
    /// # 默认值
    /// - 285
    async fn get_heavy_weight_threshold_lbs(&self) -> ConfigResult<f64>;

    /// 提货准备工作日数
    ///
    /// # 默认值
    /// - 2
    async fn get_pickup_lead_business_days(&self) -> ConfigResult<u32>;

    /// 在途缓冲工作日数（MABD 之前预留）
    ///
    /// # 默认值
    /// - 2
    async fn get_transit_buffer_business_days(&self) -> ConfigResult<u32>;

    // ===== 装箱预算 =====

    /// 单次装箱切片允许创建的包裹数，0 = 不限
    async fn get_pack_operation_budget(&self) -> ConfigResult<u32>;

    /// 单次装箱切片的墙钟预算 (ms)，0 = 不限
    async fn get_pack_time_budget_ms(&self) -> ConfigResult<u64>;

    // ===== 批处理 =====

    /// 批处理并发发运单数
    ///
    /// # 默认值
    /// - 4
    async fn get_batch_max_workers(&self) -> ConfigResult<usize>;
}
