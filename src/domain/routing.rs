// ==========================================
// 仓储履约装箱系统 - 路由指标领域模型
// ==========================================
// 职责: RoutingMetrics / PalletGroup / 发运单字段回写载荷
// 生命周期: 每次路由计算整体重算并覆盖旧值
// ==========================================

use crate::domain::types::{RequestType, RoutingStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 托盘共享分组（按 UPP 分组）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalletGroup {
    pub units_per_pallet: u32,
    pub total_units: u64,
    pub member_lines: Vec<String>,
    pub pallets: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMetrics {
    pub total_cartons: u64,
    pub total_volume: f64, // cuft
    pub total_weight: f64, // lbs
    pub total_pallets: u64,
    pub request_type: RequestType,
    pub pickup_date: Option<NaiveDate>,
}

/// 发运单字段回写（持久化协作方原样应用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentFieldUpdate {
    pub cartons: u64,
    pub volume: f64,
    pub weight: f64,
    pub pallet_count: u64,
    pub request_type: RequestType,
    pub pickup_date: Option<NaiveDate>,
    pub routing_status: RoutingStatus,
    pub issue_text: Option<String>,
}

impl ShipmentFieldUpdate {
    pub fn from_metrics(
        metrics: &RoutingMetrics,
        routing_status: RoutingStatus,
        issue_text: Option<String>,
    ) -> Self {
        Self {
            cartons: metrics.total_cartons,
            volume: metrics.total_volume,
            weight: metrics.total_weight,
            pallet_count: metrics.total_pallets,
            request_type: metrics.request_type,
            pickup_date: metrics.pickup_date,
            routing_status,
            issue_text,
        }
    }
}
