use crate::domain::issue::PackingIssue;
use crate::domain::pack_rule::PackRule;
use crate::domain::package::{Package, PackageContent};
use crate::domain::shipment::{CustomerPackingProfile, ShipmentLine};
use crate::domain::types::IssueKind;
use crate::engine::rule_selector::PackRuleSelector;
use tracing::{debug, instrument, warn};

/// 单行装箱策略（来自客户装箱配置）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePackPolicy {
    /// 允许末箱不满；不允许时余量并入当前规格的额外一箱
    pub partial_pack_allowed: bool,
    /// 部分装箱必须人工完成
    pub manual_partial_pack: bool,
}

impl Default for LinePackPolicy {
    fn default() -> Self {
        Self {
            partial_pack_allowed: true,
            manual_partial_pack: false,
        }
    }
}

impl From<&CustomerPackingProfile> for LinePackPolicy {
    fn from(profile: &CustomerPackingProfile) -> Self {
        Self {
            partial_pack_allowed: profile.partial_pack_allowed,
            manual_partial_pack: profile.manual_partial_pack,
        }
    }
}

/// 单行装箱结果
#[derive(Debug, Clone, Default)]
pub struct LinePackResult {
    pub packages: Vec<Package>,
    /// 本次装入数量
    pub packed_units: u32,
    /// 本次结束后仍未装的数量
    pub leftover_units: u32,
    /// 无规则 / 人工部分装箱 时的标记
    pub issue: Option<PackingIssue>,
}

impl LinePackResult {
    /// 行是否仍处于部分装箱状态
    pub fn is_partial(&self) -> bool {
        self.leftover_units > 0
    }
}

// ==========================================
// ItemPacker - 单行装箱引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ItemPacker {
    selector: PackRuleSelector,
}

impl ItemPacker {
    pub fn new() -> Self {
        Self {
            selector: PackRuleSelector::new(),
        }
    }

    /// 装箱一条明细行
    ///
    /// # 参数
    /// - `shipment_id`: 发运单ID（写入包裹）
    /// - `line`: 明细行（packed_quantity 及批次 packed_quantity 会被更新）
    /// - `rules`: 生效规则集（按阈值升序）
    /// - `policy`: 客户装箱策略
    ///
    /// # 返回
    /// 包裹方案（sequence_index 未分配）及计数
    #[instrument(skip(self, line, rules), fields(
        line_id = %line.line_id,
        item_id = %line.item_id,
        remaining = line.remaining_quantity(),
        lot_tracked = line.is_lot_tracked()
    ))]
    pub fn pack_line(
        &self,
        shipment_id: &str,
        line: &mut ShipmentLine,
        rules: &[PackRule],
        policy: LinePackPolicy,
    ) -> LinePackResult {
        let remaining = line.remaining_quantity();
        if remaining == 0 {
            return LinePackResult::default();
        }

        // 阈值为 0 的规则无法推进剩余量，视为无效
        let usable: Vec<PackRule> = rules
            .iter()
            .filter(|r| r.threshold_quantity > 0)
            .cloned()
            .collect();

        if usable.is_empty() {
            warn!("物料无可用装箱规则，标记部分装箱");
            return Self::flagged(
                PackingIssue::line(
                    IssueKind::NoRulesFound,
                    shipment_id,
                    &line.line_id,
                    &line.item_id,
                    format!("物料 {} 未配置装箱规则，剩余 {} 件需人工装箱", line.item_id, remaining),
                ),
                remaining,
            );
        }

        let packable = line.packable_quantity();
        if policy.manual_partial_pack && packable < remaining {
            warn!(packable, "客户要求人工完成部分装箱");
            return Self::flagged(
                PackingIssue::line(
                    IssueKind::ManualPartialPackRequested,
                    shipment_id,
                    &line.line_id,
                    &line.item_id,
                    format!(
                        "客户要求人工完成部分装箱: 物料 {} 可装 {} / 待装 {}",
                        line.item_id, packable, remaining
                    ),
                ),
                remaining,
            );
        }

        let per_unit_weight = line.per_unit_weight();
        let mut packages = Vec::new();

        if line.is_lot_tracked() {
            // 批次模式：逐批次装箱，每批次受 (已拣 - 已装) 和行剩余共同约束
            for lot_idx in 0..line.lots.len() {
                let bound = line.lots[lot_idx].remaining().min(line.remaining_quantity());
                if bound == 0 {
                    continue;
                }

                let lot_id = line.lots[lot_idx].lot_id.clone();
                let lot_packages = self.pack_quantity(
                    shipment_id,
                    line,
                    Some(&lot_id),
                    bound,
                    &usable,
                    per_unit_weight,
                    policy.partial_pack_allowed,
                );
                let lot_packed: u32 = lot_packages.iter().map(|p| p.quantity).sum();

                line.lots[lot_idx].packed_quantity += lot_packed;
                line.packed_quantity += lot_packed;
                packages.extend(lot_packages);
            }
        } else {
            let line_packages = self.pack_quantity(
                shipment_id,
                line,
                None,
                remaining,
                &usable,
                per_unit_weight,
                policy.partial_pack_allowed,
            );
            line.packed_quantity += line_packages.iter().map(|p| p.quantity).sum::<u32>();
            packages.extend(line_packages);
        }

        let packed_units = packages.iter().map(|p| p.quantity).sum();
        let leftover_units = line.remaining_quantity();

        debug!(
            packages = packages.len(),
            packed_units,
            leftover_units,
            "明细行装箱完成"
        );

        LinePackResult {
            packages,
            packed_units,
            leftover_units,
            issue: None,
        }
    }

    fn flagged(issue: PackingIssue, remaining: u32) -> LinePackResult {
        LinePackResult {
            packages: Vec::new(),
            packed_units: 0,
            leftover_units: remaining,
            issue: Some(issue),
        }
    }

    /// 贪心装箱循环
    ///
    /// 每轮: 选最佳规则 → 装 min(剩余, 阈值) → 重量 = 数量×单件重 + 包材重
    /// 不允许末箱不满时: 余量 < 下一档较小规则阈值 → 并入当前规格的额外一箱
    #[allow(clippy::too_many_arguments)]
    fn pack_quantity(
        &self,
        shipment_id: &str,
        line: &ShipmentLine,
        lot_id: Option<&str>,
        quantity: u32,
        rules: &[PackRule],
        per_unit_weight: f64,
        partial_pack_allowed: bool,
    ) -> Vec<Package> {
        let mut packages = Vec::new();
        let mut remaining = quantity;
        let mut previous: Option<&PackRule> = None;

        while remaining > 0 {
            let Some(mut rule) = self.selector.select_best_rule(rules, remaining) else {
                break;
            };

            if !partial_pack_allowed {
                if let Some(current) = previous {
                    let floor = self
                        .selector
                        .next_smaller_rule(rules, current)
                        .unwrap_or(current)
                        .threshold_quantity;
                    if remaining < floor {
                        debug!(
                            remaining,
                            package_type_id = %current.package_type_id,
                            "余量并入当前规格额外一箱"
                        );
                        rule = current;
                    }
                }
            }

            let pack_qty = remaining.min(rule.threshold_quantity);
            packages.push(Package {
                package_id: None,
                shipment_id: shipment_id.to_string(),
                sequence_index: 0,
                quantity: pack_qty,
                package_type_id: rule.package_type_id.clone(),
                weight: pack_qty as f64 * per_unit_weight + rule.fixed_weight,
                dimensions: rule.dimensions,
                contents: vec![PackageContent {
                    line_id: line.line_id.clone(),
                    item_id: line.item_id.clone(),
                    quantity: pack_qty,
                    lot_id: lot_id.map(str::to_string),
                }],
            });

            remaining -= pack_qty;
            previous = Some(rule);
        }

        packages
    }
}
