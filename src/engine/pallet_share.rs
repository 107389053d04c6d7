// ==========================================
// 仓储履约装箱系统 - 托盘共享计算
// ==========================================
// 职责: 按每托盘件数(UPP)分组，计算跨物料共享后的托盘数
// 输入: 明细行（UPP 已解析）+ 托盘模式 + 缺失 UPP 策略
// 输出: 托盘总数 + 分组明细 + 缺失 UPP 的行
// ==========================================
// GROUPED : Σ每组 ceil(Σ数量 / UPP)
// PER_LINE: max(1, ceil(Σ 数量/UPP))
// 缺失 UPP: EXCLUDE 不参与托盘计算；DEFAULT_TO_ONE 按 UPP=1 计
// ==========================================

use crate::domain::routing::PalletGroup;
use crate::domain::shipment::ShipmentLine;
use crate::domain::types::{MissingUppPolicy, PalletMode};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// 浮点累加误差容忍（避免 2.0000000001 向上取整成 3）
const FRACTION_EPSILON: f64 = 1e-9;

/// 托盘计算结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PalletComputation {
    pub total_pallets: u64,
    pub groups: Vec<PalletGroup>,
    /// 缺失 UPP 的行: (line_id, item_id)
    pub missing_upp_lines: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
pub struct PalletShareCalculator {
    mode: PalletMode,
    missing_policy: MissingUppPolicy,
}

impl PalletShareCalculator {
    pub fn new(mode: PalletMode, missing_policy: MissingUppPolicy) -> Self {
        Self {
            mode,
            missing_policy,
        }
    }

    /// 计算托盘数（数量取订购数量）
    #[instrument(skip(self, lines), fields(mode = %self.mode, lines = lines.len()))]
    pub fn compute_pallets(&self, lines: &[ShipmentLine]) -> PalletComputation {
        let mut missing_upp_lines = Vec::new();
        let mut contributing: Vec<(&ShipmentLine, u32)> = Vec::new();

        for line in lines {
            match line.valid_units_per_pallet() {
                Some(upp) => contributing.push((line, upp)),
                None => {
                    missing_upp_lines.push((line.line_id.clone(), line.item_id.clone()));
                    if self.missing_policy == MissingUppPolicy::DefaultToOne {
                        contributing.push((line, 1));
                    }
                }
            }
        }

        let groups = Self::build_groups(&contributing);
        let total_pallets = match self.mode {
            PalletMode::Grouped => groups.iter().map(|g| g.pallets).sum(),
            PalletMode::PerLine => Self::sum_of_fractions(&contributing),
        };

        debug!(
            total_pallets,
            groups = groups.len(),
            missing = missing_upp_lines.len(),
            "托盘计算完成"
        );

        PalletComputation {
            total_pallets,
            groups,
            missing_upp_lines,
        }
    }

    fn build_groups(contributing: &[(&ShipmentLine, u32)]) -> Vec<PalletGroup> {
        let mut by_upp: BTreeMap<u32, PalletGroup> = BTreeMap::new();
        for (line, upp) in contributing {
            let group = by_upp.entry(*upp).or_insert_with(|| PalletGroup {
                units_per_pallet: *upp,
                total_units: 0,
                member_lines: Vec::new(),
                pallets: 0,
            });
            group.total_units += u64::from(line.ordered_quantity);
            group.member_lines.push(line.line_id.clone());
        }

        by_upp
            .into_values()
            .map(|mut group| {
                group.pallets = if group.units_per_pallet > 0 {
                    group.total_units.div_ceil(u64::from(group.units_per_pallet))
                } else {
                    group.total_units
                };
                group
            })
            .collect()
    }

    fn sum_of_fractions(contributing: &[(&ShipmentLine, u32)]) -> u64 {
        if contributing.is_empty() {
            return 0;
        }
        let sum: f64 = contributing
            .iter()
            .map(|(line, upp)| f64::from(line.ordered_quantity) / f64::from(*upp))
            .sum();
        ((sum - FRACTION_EPSILON).ceil().max(1.0)) as u64
    }
}
