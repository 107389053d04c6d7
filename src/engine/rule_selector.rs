// ==========================================
// 仓储履约装箱系统 - 装箱规则选择器
// ==========================================
// 职责: 为剩余数量选出最贴合的装箱规则
// 输入: 按 threshold_quantity 升序的规则集 + 剩余数量
// 输出: 恰好一条规则
// ==========================================
// 规则:
// 1) 阈值 < 剩余数量的规则一律视为改进，持续替换 best
// 2) 第一条阈值 >= 剩余数量的规则为终止候选:
//    超出量 <= 不足量 时替换 best（平局取大规格），随后停止扫描
// 3) 最小规则阈值已超过剩余数量时返回最小规则
// ==========================================

use crate::domain::pack_rule::PackRule;

#[derive(Debug, Clone, Copy, Default)]
pub struct PackRuleSelector;

impl PackRuleSelector {
    pub fn new() -> Self {
        Self
    }

    /// 选择最佳规则；空规则集返回 None
    pub fn select_best_rule<'a>(&self, rules: &'a [PackRule], remaining: u32) -> Option<&'a PackRule> {
        debug_assert!(
            rules
                .windows(2)
                .all(|w| w[0].threshold_quantity <= w[1].threshold_quantity),
            "规则集必须按阈值升序"
        );

        let mut best = rules.first()?;
        let remaining = i64::from(remaining);

        for rule in rules {
            let threshold = i64::from(rule.threshold_quantity);
            if threshold < remaining {
                best = rule;
                continue;
            }

            let best_diff = remaining - i64::from(best.threshold_quantity);
            let curr_diff = threshold - remaining;
            if curr_diff <= best_diff {
                best = rule;
            }
            break;
        }

        Some(best)
    }

    /// 比 `current` 阈值小的最大规则（无则 None）
    pub fn next_smaller_rule<'a>(&self, rules: &'a [PackRule], current: &PackRule) -> Option<&'a PackRule> {
        rules
            .iter()
            .filter(|r| r.threshold_quantity < current.threshold_quantity)
            .last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(thresholds: &[u32]) -> Vec<PackRule> {
        thresholds
            .iter()
            .map(|&t| PackRule::global("ITEM-A", t, &format!("PKG{}", t), 0.5))
            .collect()
    }

    fn pick(rules: &[PackRule], remaining: u32) -> u32 {
        PackRuleSelector::new()
            .select_best_rule(rules, remaining)
            .map(|r| r.threshold_quantity)
            .unwrap()
    }

    #[test]
    fn test_empty_rule_set_returns_none() {
        assert!(PackRuleSelector::new().select_best_rule(&[], 10).is_none());
    }

    #[test]
    fn test_exact_match_selected() {
        let set = rules(&[6, 12, 24]);
        assert_eq!(pick(&set, 12), 12);
        assert_eq!(pick(&set, 6), 6);
    }

    #[test]
    fn test_smallest_rule_when_remaining_below_all() {
        let set = rules(&[6, 12, 24]);
        assert_eq!(pick(&set, 2), 6);
    }

    #[test]
    fn test_largest_rule_when_remaining_above_all() {
        let set = rules(&[6, 12, 24]);
        assert_eq!(pick(&set, 100), 24);
    }

    #[test]
    fn test_overshoot_compared_against_shortfall() {
        let set = rules(&[6, 12, 24]);
        // 10: 不足 4 vs 超出 2 → 12
        assert_eq!(pick(&set, 10), 12);
        // 8: 不足 2 vs 超出 4 → 6
        assert_eq!(pick(&set, 8), 6);
        // 20: 不足 8 vs 超出 4 → 24
        assert_eq!(pick(&set, 20), 24);
    }

    #[test]
    fn test_tie_favors_larger_rule() {
        let set = rules(&[6, 12, 24]);
        // 9: 不足 3 vs 超出 3 → 12
        assert_eq!(pick(&set, 9), 12);
        // 18: 不足 6 vs 超出 6 → 24
        assert_eq!(pick(&set, 18), 24);
    }

    #[test]
    fn test_never_prefers_smaller_rule_over_better_fitting_larger() {
        let set = rules(&[1, 5, 10, 50]);
        for remaining in 1..=60u32 {
            let chosen = pick(&set, remaining);
            let overshoot = |t: u32| (i64::from(t) - i64::from(remaining)).abs();
            // 任何更大的规则都不能与选中规则同样贴合或更贴合
            for rule in &set {
                if rule.threshold_quantity > chosen {
                    assert!(
                        overshoot(rule.threshold_quantity) > overshoot(chosen),
                        "remaining={} chosen={} better={}",
                        remaining,
                        chosen,
                        rule.threshold_quantity
                    );
                }
            }
        }
    }

    #[test]
    fn test_next_smaller_rule() {
        let set = rules(&[6, 12, 24]);
        let selector = PackRuleSelector::new();
        assert_eq!(
            selector.next_smaller_rule(&set, &set[2]).map(|r| r.threshold_quantity),
            Some(12)
        );
        assert!(selector.next_smaller_rule(&set, &set[0]).is_none());
    }
}
