// ==========================================
// 仓储履约装箱系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod checkpoint;
pub mod issue;
pub mod pack_rule;
pub mod package;
pub mod routing;
pub mod shipment;
pub mod types;

// 重导出核心类型
pub use checkpoint::PackingCheckpoint;
pub use issue::{combine_issue_messages, PackingIssue};
pub use pack_rule::{sort_rules_ascending, Dimensions, PackRule, RuleScope};
pub use package::{Package, PackageContent, SequenceAllocator};
pub use routing::{PalletGroup, RoutingMetrics, ShipmentFieldUpdate};
pub use shipment::{CustomerPackingProfile, LotAssignment, Shipment, ShipmentLine};
pub use types::{IssueKind, MissingUppPolicy, PalletMode, PickupPolicy, RequestType, RoutingStatus};
