// ==========================================
// 仓储履约装箱系统 - 发运单领域模型
// ==========================================
// 职责: Shipment / ShipmentLine / LotAssignment / 客户装箱配置
// 红线: packed_quantity ≤ ordered_quantity; 批次 packed ≤ picked
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Shipment - 发运单头
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,
    pub customer_id: Option<String>,
    pub location_id: String,      // 发货仓库
    pub mabd: Option<NaiveDate>,  // Must Arrive By Date
}

// ==========================================
// LotAssignment - 批次分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotAssignment {
    pub lot_id: String,
    pub picked_quantity: u32,
    pub packed_quantity: u32,
    pub expiration: Option<NaiveDate>,
}

impl LotAssignment {
    /// 批次剩余可装数量（已拣 - 已装）
    pub fn remaining(&self) -> u32 {
        self.picked_quantity.saturating_sub(self.packed_quantity)
    }
}

// ==========================================
// ShipmentLine - 发运明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentLine {
    // ===== 标识 =====
    pub line_id: String,
    pub item_id: String,
    pub unit_key: Option<String>, // 计量单位键（用于装箱规则作用域）

    // ===== 数量 =====
    pub ordered_quantity: u32,
    pub packed_quantity: u32,

    // ===== 物料包装参数 =====
    pub units_per_carton: Option<u32>,
    pub cubic_feet_per_carton: Option<f64>,
    pub weight_per_carton: Option<f64>, // lbs，缺失需上报
    pub units_per_pallet: Option<u32>,  // 缺失需上报

    // ===== 批次 =====
    pub lots: Vec<LotAssignment>,
}

impl ShipmentLine {
    /// 创建无批次、无包装参数的明细行（其余字段按需补充）
    pub fn new(line_id: &str, item_id: &str, ordered_quantity: u32) -> Self {
        Self {
            line_id: line_id.to_string(),
            item_id: item_id.to_string(),
            unit_key: None,
            ordered_quantity,
            packed_quantity: 0,
            units_per_carton: None,
            cubic_feet_per_carton: None,
            weight_per_carton: None,
            units_per_pallet: None,
            lots: Vec::new(),
        }
    }

    /// 剩余待装数量
    pub fn remaining_quantity(&self) -> u32 {
        self.ordered_quantity.saturating_sub(self.packed_quantity)
    }

    pub fn is_fully_packed(&self) -> bool {
        self.remaining_quantity() == 0
    }

    /// 是否启用批次追踪（存在批次分配即视为启用）
    pub fn is_lot_tracked(&self) -> bool {
        !self.lots.is_empty()
    }

    /// 本次可装数量
    ///
    /// - 非批次行: 剩余订购数量
    /// - 批次行: min(剩余订购数量, Σ批次剩余)
    pub fn packable_quantity(&self) -> u32 {
        let remaining = self.remaining_quantity();
        if !self.is_lot_tracked() {
            return remaining;
        }
        let lot_remaining: u32 = self.lots.iter().map(|l| l.remaining()).sum();
        remaining.min(lot_remaining)
    }

    /// 有效的每箱件数（0 视为缺失）
    pub fn valid_units_per_carton(&self) -> Option<u32> {
        self.units_per_carton.filter(|&u| u > 0)
    }

    /// 有效的每托盘件数（0 视为缺失）
    pub fn valid_units_per_pallet(&self) -> Option<u32> {
        self.units_per_pallet.filter(|&u| u > 0)
    }

    /// 有效的箱重（非有限值或负数视为缺失）
    pub fn valid_weight_per_carton(&self) -> Option<f64> {
        self.weight_per_carton.filter(|w| w.is_finite() && *w >= 0.0)
    }

    /// 单件重量 = 箱重 / 每箱件数；任一缺失返回 0
    pub fn per_unit_weight(&self) -> f64 {
        match (self.valid_weight_per_carton(), self.valid_units_per_carton()) {
            (Some(weight), Some(units)) => weight / units as f64,
            _ => 0.0,
        }
    }
}

// ==========================================
// CustomerPackingProfile - 客户装箱配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPackingProfile {
    pub customer_id: String,
    /// 允许末箱不满（否则余量并入当前规格的额外整箱）
    pub partial_pack_allowed: bool,
    /// 部分装箱必须人工完成（该行不自动出箱）
    pub manual_partial_pack: bool,
}

impl CustomerPackingProfile {
    /// 未配置客户的默认配置
    pub fn default_for(customer_id: &str) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            partial_pack_allowed: true,
            manual_partial_pack: false,
        }
    }
}
