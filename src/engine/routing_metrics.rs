// ==========================================
// 仓储履约装箱系统 - 路由指标计算
// ==========================================
// 职责: 汇总箱数/体积/重量，判定提货申请类型
// 红线: 箱重缺失按 0 计算，但必须上报（不允许静默忽略）
// 红线: 重货判定为严格大于阈值
// ==========================================

use crate::domain::shipment::ShipmentLine;
use crate::domain::types::RequestType;
use tracing::{debug, instrument};

/// 默认重货阈值 (lbs)
pub const DEFAULT_HEAVY_WEIGHT_THRESHOLD_LBS: f64 = 285.0;

/// 箱数/体积/重量汇总
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartonTotals {
    pub total_cartons: u64,
    pub total_volume: f64,
    pub total_weight: f64,
    /// 缺失箱重的行: (line_id, item_id)
    pub missing_weight_lines: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
pub struct RoutingMetricsCalculator {
    heavy_weight_threshold: f64,
}

impl Default for RoutingMetricsCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_HEAVY_WEIGHT_THRESHOLD_LBS)
    }
}

impl RoutingMetricsCalculator {
    pub fn new(heavy_weight_threshold: f64) -> Self {
        Self {
            heavy_weight_threshold,
        }
    }

    /// 单行箱数 = ceil(数量 / 每箱件数)；每箱件数缺失时每件一箱
    pub fn cartons_for_line(&self, line: &ShipmentLine) -> u64 {
        let quantity = u64::from(line.ordered_quantity);
        match line.valid_units_per_carton() {
            Some(upc) => quantity.div_ceil(u64::from(upc)),
            None => quantity,
        }
    }

    /// 汇总箱数、体积、重量
    ///
    /// 体积 = Σ 每箱立方英尺 × max(1, 箱数)
    /// 重量 = Σ 箱重 × max(1, 箱数)
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub fn compute_totals(&self, lines: &[ShipmentLine]) -> CartonTotals {
        let mut totals = CartonTotals::default();

        for line in lines {
            let cartons = self.cartons_for_line(line);
            let billable = cartons.max(1) as f64;

            totals.total_cartons += cartons;
            totals.total_volume += line.cubic_feet_per_carton.unwrap_or(0.0) * billable;

            match line.valid_weight_per_carton() {
                Some(weight) => totals.total_weight += weight * billable,
                None => totals
                    .missing_weight_lines
                    .push((line.line_id.clone(), line.item_id.clone())),
            }
        }

        debug!(
            total_cartons = totals.total_cartons,
            total_volume = totals.total_volume,
            total_weight = totals.total_weight,
            missing_weight = totals.missing_weight_lines.len(),
            "箱数/体积/重量汇总完成"
        );

        totals
    }

    /// 总重 > 阈值 → 1（重货），否则 2
    pub fn request_type(&self, total_weight: f64) -> RequestType {
        if total_weight > self.heavy_weight_threshold {
            RequestType::Heavy
        } else {
            RequestType::Standard
        }
    }
}
