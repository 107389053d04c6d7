// ==========================================
// 仓储履约装箱系统 - 装箱断点模型
// ==========================================
// 职责: 预算耗尽时落库的续跑游标
// 红线: 续跑时已装数量一律从已提交包裹重算，不信任内存状态
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingCheckpoint {
    pub shipment_id: String,
    pub run_id: String,
    /// 下一条待处理明细行下标
    pub cursor: usize,
    pub packages_created: u32,
    pub units_packed: u64,
    pub package_ids: Vec<String>,
    /// 本次运行中已标记部分装箱的行（续跑时不重复处理）
    pub skipped_line_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl PackingCheckpoint {
    pub fn new(shipment_id: &str, run_id: &str) -> Self {
        Self {
            shipment_id: shipment_id.to_string(),
            run_id: run_id.to_string(),
            cursor: 0,
            packages_created: 0,
            units_packed: 0,
            package_ids: Vec::new(),
            skipped_line_ids: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_skipped(&self, line_id: &str) -> bool {
        self.skipped_line_ids.iter().any(|id| id == line_id)
    }
}
