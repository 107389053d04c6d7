// ==========================================
// 仓储履约装箱系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod checkpoint_repo;
pub mod error;
pub mod issue_repo;
pub mod location_pallet_repo;
pub mod memory_store;
pub mod pack_rule_repo;
pub mod package_repo;
pub mod shipment_repo;

// 重导出核心仓储
pub use checkpoint_repo::CheckpointRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use issue_repo::PackingIssueRepository;
pub use location_pallet_repo::LocationPalletRepository;
pub use memory_store::MemoryStore;
pub use pack_rule_repo::PackRuleRepository;
pub use package_repo::PackageRepository;
pub use shipment_repo::ShipmentRepository;
