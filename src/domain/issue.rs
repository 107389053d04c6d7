// ==========================================
// 仓储履约装箱系统 - 问题上报模型
// ==========================================
// 红线: 所有问题必须输出原因，按发运单聚合成一条消息
// ==========================================

use crate::domain::types::IssueKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingIssue {
    pub kind: IssueKind,
    pub shipment_id: String,
    pub line_id: Option<String>,
    pub item_id: Option<String>,
    pub message: String,
}

impl PackingIssue {
    /// 发运单级问题
    pub fn shipment(kind: IssueKind, shipment_id: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            shipment_id: shipment_id.to_string(),
            line_id: None,
            item_id: None,
            message: message.into(),
        }
    }

    /// 明细行级问题
    pub fn line(
        kind: IssueKind,
        shipment_id: &str,
        line_id: &str,
        item_id: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            shipment_id: shipment_id.to_string(),
            line_id: Some(line_id.to_string()),
            item_id: Some(item_id.to_string()),
            message: message.into(),
        }
    }
}

/// 将问题列表合并为一条消息（保持上报顺序）
pub fn combine_issue_messages(issues: &[PackingIssue]) -> Option<String> {
    if issues.is_empty() {
        return None;
    }
    Some(
        issues
            .iter()
            .map(|i| format!("[{}] {}", i.kind, i.message))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_issue_messages() {
        assert_eq!(combine_issue_messages(&[]), None);

        let issues = vec![
            PackingIssue::line(IssueKind::MissingUnitsPerPallet, "S1", "L2", "ITEM-B", "物料 ITEM-B 缺少每托盘件数"),
            PackingIssue::shipment(IssueKind::PickupDateUnresolved, "S1", "缺少 MABD"),
        ];
        assert_eq!(
            combine_issue_messages(&issues).as_deref(),
            Some("[MISSING_UNITS_PER_PALLET] 物料 ITEM-B 缺少每托盘件数; [PICKUP_DATE_UNRESOLVED] 缺少 MABD")
        );
    }
}
