// ==========================================
// 仓储履约装箱系统 - 装箱规则作用域解析
// ==========================================
// 职责: 从候选规则中挑出唯一生效的作用域
// 优先级: 客户+单位 > 仅客户 > 仅单位 > 全局
// 红线: 只选一个作用域，不同作用域的规则绝不合并
// ==========================================

use crate::domain::pack_rule::{sort_rules_ascending, PackRule, RuleScope};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleScopeResolver;

impl RuleScopeResolver {
    pub fn new() -> Self {
        Self
    }

    /// 解析生效规则集（已按阈值升序）
    ///
    /// 其他客户/其他单位的规则直接忽略；没有任何作用域命中时返回空集
    pub fn resolve(
        &self,
        candidates: Vec<PackRule>,
        item_id: &str,
        customer_id: Option<&str>,
        unit_key: Option<&str>,
    ) -> Vec<PackRule> {
        let applicable: Vec<PackRule> = candidates
            .into_iter()
            .filter(|r| r.item_id == item_id)
            .filter(|r| Self::matches(r, customer_id, unit_key))
            .collect();

        let scope = [
            RuleScope::CustomerAndUnit,
            RuleScope::CustomerOnly,
            RuleScope::UnitOnly,
            RuleScope::Global,
        ]
        .into_iter()
        .find(|scope| applicable.iter().any(|r| r.scope() == *scope));

        let Some(scope) = scope else {
            return Vec::new();
        };

        let mut selected: Vec<PackRule> = applicable
            .into_iter()
            .filter(|r| r.scope() == scope)
            .collect();
        sort_rules_ascending(&mut selected);

        debug!(item_id, ?scope, rules = selected.len(), "装箱规则作用域已确定");
        selected
    }

    fn matches(rule: &PackRule, customer_id: Option<&str>, unit_key: Option<&str>) -> bool {
        let customer_ok = match rule.customer_id.as_deref() {
            None => true,
            Some(c) => Some(c) == customer_id,
        };
        let unit_ok = match rule.unit_key.as_deref() {
            None => true,
            Some(u) => Some(u) == unit_key,
        };
        customer_ok && unit_ok
    }
}
