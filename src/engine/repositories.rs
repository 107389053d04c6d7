// ==========================================
// 仓储履约装箱系统 - 引擎层仓储聚合
// ==========================================
// 职责: 在同一 SQLite 连接上构造全部 Repository，并转换为引擎协作方
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::engine::collaborators::FulfillmentCollaborators;
use crate::repository::{
    CheckpointRepository, LocationPalletRepository, PackRuleRepository, PackageRepository,
    PackingIssueRepository, ShipmentRepository,
};

/// 履约仓储集合
///
/// 所有仓储共享一个 `Arc<Mutex<Connection>>`，
/// 通过 [`FulfillmentRepositories::collaborators`] 注入编排器。
#[derive(Clone)]
pub struct FulfillmentRepositories {
    pub shipment_repo: Arc<ShipmentRepository>,
    pub pack_rule_repo: Arc<PackRuleRepository>,
    pub location_pallet_repo: Arc<LocationPalletRepository>,
    pub package_repo: Arc<PackageRepository>,
    pub issue_repo: Arc<PackingIssueRepository>,
    pub checkpoint_repo: Arc<CheckpointRepository>,
}

impl FulfillmentRepositories {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            shipment_repo: Arc::new(ShipmentRepository::from_connection(conn.clone())),
            pack_rule_repo: Arc::new(PackRuleRepository::from_connection(conn.clone())),
            location_pallet_repo: Arc::new(LocationPalletRepository::from_connection(conn.clone())),
            package_repo: Arc::new(PackageRepository::from_connection(conn.clone())),
            issue_repo: Arc::new(PackingIssueRepository::from_connection(conn.clone())),
            checkpoint_repo: Arc::new(CheckpointRepository::from_connection(conn)),
        }
    }

    /// 转换为编排器协作方集合
    pub fn collaborators(&self) -> FulfillmentCollaborators {
        FulfillmentCollaborators {
            shipments: self.shipment_repo.clone(),
            rules: self.pack_rule_repo.clone(),
            pallet_config: self.location_pallet_repo.clone(),
            packages: self.package_repo.clone(),
            shipment_writer: self.shipment_repo.clone(),
            issues: self.issue_repo.clone(),
            checkpoints: self.checkpoint_repo.clone(),
        }
    }
}

// 注: 聚合本身没有逻辑，正确性由 tests/ 下基于 SQLite 的集成测试验证。
