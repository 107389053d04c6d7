// ==========================================
// 仓储履约装箱系统 - 领域类型定义
// ==========================================
// 职责: 状态枚举 + 策略枚举（托盘/提货日期/缺失数据）
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库/配置一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 路由状态 (Routing Status)
// ==========================================
// 红线: 只有提货日期已确定 + 无托盘数据缺失 + 无箱重缺失 才能 READY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingStatus {
    Ready,   // 可申请承运商提货
    Blocked, // 存在阻断原因
}

impl RoutingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingStatus::Ready => "READY",
            RoutingStatus::Blocked => "BLOCKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "READY" => Some(RoutingStatus::Ready),
            "BLOCKED" => Some(RoutingStatus::Blocked),
            _ => None,
        }
    }
}

impl fmt::Display for RoutingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 提货申请类型 (Request Type)
// ==========================================
// 1 = 重货（总重 > 阈值），2 = 普通
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Heavy,
    Standard,
}

impl RequestType {
    /// 承运商接口使用的数值编码
    pub fn code(&self) -> i32 {
        match self {
            RequestType::Heavy => 1,
            RequestType::Standard => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(RequestType::Heavy),
            2 => Some(RequestType::Standard),
            _ => None,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 托盘计算模式 (Pallet Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PalletMode {
    Grouped, // 按 UPP 分组共享托盘
    PerLine, // 逐行分数累加
}

impl PalletMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PalletMode::Grouped => "GROUPED",
            PalletMode::PerLine => "PER_LINE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GROUPED" => Some(PalletMode::Grouped),
            "PER_LINE" => Some(PalletMode::PerLine),
            _ => None,
        }
    }
}

impl fmt::Display for PalletMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 缺失 UPP 处理策略 (Missing Units-Per-Pallet Policy)
// ==========================================
// 两种策略下该行都会上报问题并阻断 READY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissingUppPolicy {
    Exclude,      // 不参与托盘计算（仍参与箱数/重量）
    DefaultToOne, // 按 UPP=1 参与托盘计算
}

impl MissingUppPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingUppPolicy::Exclude => "EXCLUDE",
            MissingUppPolicy::DefaultToOne => "DEFAULT_TO_ONE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EXCLUDE" => Some(MissingUppPolicy::Exclude),
            "DEFAULT_TO_ONE" => Some(MissingUppPolicy::DefaultToOne),
            _ => None,
        }
    }
}

impl fmt::Display for MissingUppPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 提货日期策略 (Pickup Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickupPolicy {
    Window, // 窗口内推到最晚；窗口倒挂时取最早
    Strict, // 固定倒推，违反约束直接拒绝
}

impl PickupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickupPolicy::Window => "WINDOW",
            PickupPolicy::Strict => "STRICT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WINDOW" => Some(PickupPolicy::Window),
            "STRICT" => Some(PickupPolicy::Strict),
            _ => None,
        }
    }
}

impl fmt::Display for PickupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 问题类型 (Issue Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    NoRulesFound,
    ManualPartialPackRequested,
    MissingUnitsPerPallet,
    MissingCartonWeight,
    PickupDateUnresolved,
    ComputationFailed,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::NoRulesFound => "NO_RULES_FOUND",
            IssueKind::ManualPartialPackRequested => "MANUAL_PARTIAL_PACK_REQUESTED",
            IssueKind::MissingUnitsPerPallet => "MISSING_UNITS_PER_PALLET",
            IssueKind::MissingCartonWeight => "MISSING_CARTON_WEIGHT",
            IssueKind::PickupDateUnresolved => "PICKUP_DATE_UNRESOLVED",
            IssueKind::ComputationFailed => "COMPUTATION_FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NO_RULES_FOUND" => Some(IssueKind::NoRulesFound),
            "MANUAL_PARTIAL_PACK_REQUESTED" => Some(IssueKind::ManualPartialPackRequested),
            "MISSING_UNITS_PER_PALLET" => Some(IssueKind::MissingUnitsPerPallet),
            "MISSING_CARTON_WEIGHT" => Some(IssueKind::MissingCartonWeight),
            "PICKUP_DATE_UNRESOLVED" => Some(IssueKind::PickupDateUnresolved),
            "COMPUTATION_FAILED" => Some(IssueKind::ComputationFailed),
            _ => None,
        }
    }

    /// 是否为装箱阶段问题（会导致行部分装箱）
    pub fn is_packing_issue(&self) -> bool {
        matches!(
            self,
            IssueKind::NoRulesFound | IssueKind::ManualPartialPackRequested
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_codes() {
        assert_eq!(RequestType::Heavy.code(), 1);
        assert_eq!(RequestType::Standard.code(), 2);
        assert_eq!(RequestType::from_code(2), Some(RequestType::Standard));
        assert_eq!(RequestType::from_code(3), None);
    }

    #[test]
    fn test_policy_parse_is_case_insensitive() {
        assert_eq!(PalletMode::parse("per_line"), Some(PalletMode::PerLine));
        assert_eq!(PickupPolicy::parse(" strict "), Some(PickupPolicy::Strict));
        assert_eq!(
            MissingUppPolicy::parse("default_to_one"),
            Some(MissingUppPolicy::DefaultToOne)
        );
        assert_eq!(PalletMode::parse("bogus"), None);
    }
}
