// ==========================================
// 仓储履约装箱系统 - 引擎层
// ==========================================
// 职责: 装箱规则选择、单行装箱、托盘共享、工作日计算、路由判定与编排
// 红线: Engine 不拼 SQL, 所有阻断/部分装箱必须输出原因
// ==========================================

pub mod batch;
pub mod calendar;
pub mod collaborators;
pub mod error;
pub mod item_packer;
pub mod packing_orchestrator;
pub mod pallet_share;
pub mod pickup_scheduler;
pub mod repositories;
pub mod routing_metrics;
pub mod routing_orchestrator;
pub mod rule_scope;
pub mod rule_selector;

// 重导出核心引擎
pub use batch::{BatchRunner, BatchSummary, RunContext, ShipmentRunResult, ShipmentRunStatus};
pub use calendar::BusinessDayCalendar;
pub use collaborators::{
    CheckpointStore, FulfillmentCollaborators, IssueReporter, PackRuleReader, PackageStore,
    PalletConfigReader, ShipmentReader, ShipmentWriter,
};
pub use error::{EngineError, EngineResult};
pub use item_packer::{ItemPacker, LinePackPolicy, LinePackResult};
pub use packing_orchestrator::{PackingBudget, PackingOrchestrator, PackingOutcome, PackingReport};
pub use pallet_share::{PalletComputation, PalletShareCalculator};
pub use pickup_scheduler::{PickupRejection, PickupScheduler};
pub use repositories::FulfillmentRepositories;
pub use routing_metrics::{CartonTotals, RoutingMetricsCalculator, DEFAULT_HEAVY_WEIGHT_THRESHOLD_LBS};
pub use routing_orchestrator::{RoutingDecision, RoutingOrchestrator};
pub use rule_scope::RuleScopeResolver;
pub use rule_selector::PackRuleSelector;
