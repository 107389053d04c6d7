// ==========================================
// 仓储履约装箱系统 - 引擎层协作方接口
// ==========================================
// 职责: 定义引擎读取记录/写入结果所需的 trait，实现依赖倒置
// 说明: Engine 层定义 trait，Repository 层（SQLite / 内存）实现
// 红线: 引擎不拼 SQL，所有 I/O 均为进程内数据交换
// ==========================================

use crate::domain::checkpoint::PackingCheckpoint;
use crate::domain::issue::PackingIssue;
use crate::domain::pack_rule::PackRule;
use crate::domain::package::Package;
use crate::domain::routing::ShipmentFieldUpdate;
use crate::domain::shipment::{CustomerPackingProfile, Shipment, ShipmentLine};
use crate::repository::error::RepositoryResult;
use std::sync::Arc;

// ==========================================
// 读取侧
// ==========================================

/// 发运单读取
pub trait ShipmentReader: Send + Sync {
    fn read_shipment(&self, shipment_id: &str) -> RepositoryResult<Shipment>;

    /// 含批次分配；按行顺序返回
    fn read_shipment_lines(&self, shipment_id: &str) -> RepositoryResult<Vec<ShipmentLine>>;

    /// 未配置的客户返回 None
    fn read_customer_profile(&self, customer_id: &str) -> RepositoryResult<Option<CustomerPackingProfile>>;
}

/// 装箱规则读取
///
/// 作用域优先级: 客户+单位 > 仅客户 > 仅单位 > 全局，只返回一个作用域的规则
pub trait PackRuleReader: Send + Sync {
    fn read_pack_rules(
        &self,
        item_id: &str,
        customer_id: Option<&str>,
        unit_key: Option<&str>,
    ) -> RepositoryResult<Vec<PackRule>>;
}

/// 仓库托盘配置读取
///
/// - 未登记的仓库: Some(1)
/// - 已登记仓库但该物料无配置: None（视为缺失）
pub trait PalletConfigReader: Send + Sync {
    fn read_location_pallet_config(&self, location_id: &str, item_id: &str) -> RepositoryResult<Option<u32>>;
}

// ==========================================
// 写入侧
// ==========================================

/// 包裹持久化
pub trait PackageStore: Send + Sync {
    /// 已提交的包裹（按 sequence_index 升序）
    fn list_packages(&self, shipment_id: &str) -> RepositoryResult<Vec<Package>>;

    /// 落库单个包裹，返回 package_id（sequence_index 由引擎分配）
    fn create_package(&self, package: &Package) -> RepositoryResult<String>;
}

/// 发运单字段回写
pub trait ShipmentWriter: Send + Sync {
    fn update_shipment_fields(&self, shipment_id: &str, update: &ShipmentFieldUpdate) -> RepositoryResult<()>;

    /// 计算异常时标记失败（不影响批次内其他发运单）
    fn mark_failed(&self, shipment_id: &str, reason: &str) -> RepositoryResult<()>;
}

/// 问题上报
pub trait IssueReporter: Send + Sync {
    fn report_issue(&self, issue: &PackingIssue) -> RepositoryResult<()>;
}

/// 装箱断点存储
pub trait CheckpointStore: Send + Sync {
    fn save_checkpoint(&self, checkpoint: &PackingCheckpoint) -> RepositoryResult<()>;
    fn load_checkpoint(&self, shipment_id: &str) -> RepositoryResult<Option<PackingCheckpoint>>;
    fn clear_checkpoint(&self, shipment_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// FulfillmentCollaborators - 协作方集合
// ==========================================

/// 聚合编排器所需的全部协作方，简化依赖注入
#[derive(Clone)]
pub struct FulfillmentCollaborators {
    pub shipments: Arc<dyn ShipmentReader>,
    pub rules: Arc<dyn PackRuleReader>,
    pub pallet_config: Arc<dyn PalletConfigReader>,
    pub packages: Arc<dyn PackageStore>,
    pub shipment_writer: Arc<dyn ShipmentWriter>,
    pub issues: Arc<dyn IssueReporter>,
    pub checkpoints: Arc<dyn CheckpointStore>,
}

impl FulfillmentCollaborators {
    /// 由同一个实现全部 trait 的存储构造（如内存存储）
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ShipmentReader
            + PackRuleReader
            + PalletConfigReader
            + PackageStore
            + ShipmentWriter
            + IssueReporter
            + CheckpointStore
            + 'static,
    {
        Self {
            shipments: store.clone(),
            rules: store.clone(),
            pallet_config: store.clone(),
            packages: store.clone(),
            shipment_writer: store.clone(),
            issues: store.clone(),
            checkpoints: store,
        }
    }
}
