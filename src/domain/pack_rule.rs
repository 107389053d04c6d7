// ==========================================
// 仓储履约装箱系统 - 装箱规则领域模型
// ==========================================
// 职责: (物料, 数量阈值) → (包装类型, 固定重量, 尺寸)
// 红线: 选择时规则集按 threshold_quantity 升序
// ==========================================

use serde::{Deserialize, Serialize};

/// 包装尺寸（英寸）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }
}

// ==========================================
// PackRule - 装箱规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRule {
    pub item_id: String,
    pub threshold_quantity: u32,
    pub package_type_id: String,
    pub fixed_weight: f64, // 包材重量 (lbs)
    pub dimensions: Dimensions,

    // ===== 作用域 =====
    pub customer_id: Option<String>,
    pub unit_key: Option<String>,
}

impl PackRule {
    /// 创建全局作用域规则
    pub fn global(item_id: &str, threshold_quantity: u32, package_type_id: &str, fixed_weight: f64) -> Self {
        Self {
            item_id: item_id.to_string(),
            threshold_quantity,
            package_type_id: package_type_id.to_string(),
            fixed_weight,
            dimensions: Dimensions::default(),
            customer_id: None,
            unit_key: None,
        }
    }

    pub fn scope(&self) -> RuleScope {
        match (self.customer_id.is_some(), self.unit_key.is_some()) {
            (true, true) => RuleScope::CustomerAndUnit,
            (true, false) => RuleScope::CustomerOnly,
            (false, true) => RuleScope::UnitOnly,
            (false, false) => RuleScope::Global,
        }
    }
}

/// 规则作用域（优先级从高到低）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleScope {
    CustomerAndUnit,
    CustomerOnly,
    UnitOnly,
    Global,
}

/// 按阈值升序排序（阈值相同时按包装类型保证稳定）
pub fn sort_rules_ascending(rules: &mut [PackRule]) {
    rules.sort_by(|a, b| {
        a.threshold_quantity
            .cmp(&b.threshold_quantity)
            .then_with(|| a.package_type_id.cmp(&b.package_type_id))
    });
}
