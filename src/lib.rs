// ==========================================
// 仓储履约装箱系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 发运单装箱（包裹生成）+ 发运路由（托盘数/提货日期/申请类型）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/表结构）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    IssueKind, MissingUppPolicy, PalletMode, PickupPolicy, RequestType, RoutingStatus,
};

// 领域实体
pub use domain::{
    Package, PackageContent, PackingCheckpoint, PackingIssue, PackRule, RoutingMetrics, Shipment,
    ShipmentLine,
};

// 引擎
pub use engine::{
    BatchRunner, BusinessDayCalendar, ItemPacker, PackRuleSelector, PackingOrchestrator,
    PalletShareCalculator, RoutingMetricsCalculator, RoutingOrchestrator,
};

// API
pub use api::FulfillmentApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓储履约装箱系统";
