// ==========================================
// 仓储履约装箱系统 - 内存存储
// ==========================================
// 职责: 在进程内实现全部协作方 trait（嵌入场景 / 引擎测试）
// 红线: 与 SQLite 实现保持相同语义（作用域优先级、序号唯一、仓库识别）
// ==========================================

use crate::domain::checkpoint::PackingCheckpoint;
use crate::domain::issue::PackingIssue;
use crate::domain::pack_rule::PackRule;
use crate::domain::package::Package;
use crate::domain::routing::ShipmentFieldUpdate;
use crate::domain::shipment::{CustomerPackingProfile, Shipment, ShipmentLine};
use crate::engine::collaborators::{
    CheckpointStore, IssueReporter, PackRuleReader, PackageStore, PalletConfigReader,
    ShipmentReader, ShipmentWriter,
};
use crate::engine::rule_scope::RuleScopeResolver;
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    shipments: HashMap<String, Shipment>,
    lines: HashMap<String, Vec<ShipmentLine>>,
    profiles: HashMap<String, CustomerPackingProfile>,
    rules: Vec<PackRule>,
    location_pallets: HashMap<String, HashMap<String, u32>>,
    packages: HashMap<String, Vec<Package>>,
    updates: HashMap<String, ShipmentFieldUpdate>,
    failures: HashMap<String, String>,
    issues: Vec<PackingIssue>,
    checkpoints: HashMap<String, PackingCheckpoint>,
    next_package_no: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 数据准备 =====

    pub fn insert_shipment(&self, shipment: Shipment, lines: Vec<ShipmentLine>) -> RepositoryResult<()> {
        let mut state = self.lock()?;
        state.lines.insert(shipment.shipment_id.clone(), lines);
        state.shipments.insert(shipment.shipment_id.clone(), shipment);
        Ok(())
    }

    pub fn insert_customer_profile(&self, profile: CustomerPackingProfile) -> RepositoryResult<()> {
        self.lock()?.profiles.insert(profile.customer_id.clone(), profile);
        Ok(())
    }

    pub fn insert_rules(&self, rules: impl IntoIterator<Item = PackRule>) -> RepositoryResult<()> {
        self.lock()?.rules.extend(rules);
        Ok(())
    }

    /// 登记仓库（无任何物料托盘配置）
    pub fn register_location(&self, location_id: &str) -> RepositoryResult<()> {
        self.lock()?
            .location_pallets
            .entry(location_id.to_string())
            .or_default();
        Ok(())
    }

    pub fn set_location_pallet(&self, location_id: &str, item_id: &str, units_per_pallet: u32) -> RepositoryResult<()> {
        self.lock()?
            .location_pallets
            .entry(location_id.to_string())
            .or_default()
            .insert(item_id.to_string(), units_per_pallet);
        Ok(())
    }

    // ===== 结果查询 =====

    pub fn packages(&self, shipment_id: &str) -> RepositoryResult<Vec<Package>> {
        self.list_packages(shipment_id)
    }

    pub fn field_update(&self, shipment_id: &str) -> RepositoryResult<Option<ShipmentFieldUpdate>> {
        Ok(self.lock()?.updates.get(shipment_id).cloned())
    }

    pub fn failure(&self, shipment_id: &str) -> RepositoryResult<Option<String>> {
        Ok(self.lock()?.failures.get(shipment_id).cloned())
    }

    pub fn issues(&self) -> RepositoryResult<Vec<PackingIssue>> {
        Ok(self.lock()?.issues.clone())
    }
}

impl ShipmentReader for MemoryStore {
    fn read_shipment(&self, shipment_id: &str) -> RepositoryResult<Shipment> {
        self.lock()?
            .shipments
            .get(shipment_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("Shipment", shipment_id))
    }

    fn read_shipment_lines(&self, shipment_id: &str) -> RepositoryResult<Vec<ShipmentLine>> {
        let state = self.lock()?;
        if !state.shipments.contains_key(shipment_id) {
            return Err(RepositoryError::not_found("Shipment", shipment_id));
        }
        Ok(state.lines.get(shipment_id).cloned().unwrap_or_default())
    }

    fn read_customer_profile(&self, customer_id: &str) -> RepositoryResult<Option<CustomerPackingProfile>> {
        Ok(self.lock()?.profiles.get(customer_id).cloned())
    }
}

impl PackRuleReader for MemoryStore {
    fn read_pack_rules(
        &self,
        item_id: &str,
        customer_id: Option<&str>,
        unit_key: Option<&str>,
    ) -> RepositoryResult<Vec<PackRule>> {
        let candidates: Vec<PackRule> = self
            .lock()?
            .rules
            .iter()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect();
        Ok(RuleScopeResolver::new().resolve(candidates, item_id, customer_id, unit_key))
    }
}

impl PalletConfigReader for MemoryStore {
    fn read_location_pallet_config(&self, location_id: &str, item_id: &str) -> RepositoryResult<Option<u32>> {
        let state = self.lock()?;
        Ok(match state.location_pallets.get(location_id) {
            None => Some(1),
            Some(items) => items.get(item_id).copied().filter(|&upp| upp > 0),
        })
    }
}

impl PackageStore for MemoryStore {
    fn list_packages(&self, shipment_id: &str) -> RepositoryResult<Vec<Package>> {
        let mut packages = self
            .lock()?
            .packages
            .get(shipment_id)
            .cloned()
            .unwrap_or_default();
        packages.sort_by_key(|p| p.sequence_index);
        Ok(packages)
    }

    fn create_package(&self, package: &Package) -> RepositoryResult<String> {
        if package.contents.is_empty() {
            return Err(RepositoryError::ValidationError("包裹内容不能为空".to_string()));
        }
        if package.sequence_index == 0 {
            return Err(RepositoryError::field_value("sequence_index", "包裹序号未分配"));
        }

        let mut state = self.lock()?;
        let existing = state.packages.entry(package.shipment_id.clone()).or_default();
        if existing.iter().any(|p| p.sequence_index == package.sequence_index) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "package({}, {})",
                package.shipment_id, package.sequence_index
            )));
        }

        state.next_package_no += 1;
        let package_id = format!("PKG-{:06}", state.next_package_no);
        let mut stored = package.clone();
        stored.package_id = Some(package_id.clone());
        state
            .packages
            .entry(package.shipment_id.clone())
            .or_default()
            .push(stored);
        Ok(package_id)
    }
}

impl ShipmentWriter for MemoryStore {
    fn update_shipment_fields(&self, shipment_id: &str, update: &ShipmentFieldUpdate) -> RepositoryResult<()> {
        let mut state = self.lock()?;
        if !state.shipments.contains_key(shipment_id) {
            return Err(RepositoryError::not_found("Shipment", shipment_id));
        }
        state.failures.remove(shipment_id);
        state.updates.insert(shipment_id.to_string(), update.clone());
        Ok(())
    }

    fn mark_failed(&self, shipment_id: &str, reason: &str) -> RepositoryResult<()> {
        self.lock()?
            .failures
            .insert(shipment_id.to_string(), reason.to_string());
        Ok(())
    }
}

impl IssueReporter for MemoryStore {
    fn report_issue(&self, issue: &PackingIssue) -> RepositoryResult<()> {
        self.lock()?.issues.push(issue.clone());
        Ok(())
    }
}

impl CheckpointStore for MemoryStore {
    fn save_checkpoint(&self, checkpoint: &PackingCheckpoint) -> RepositoryResult<()> {
        self.lock()?
            .checkpoints
            .insert(checkpoint.shipment_id.clone(), checkpoint.clone());
        Ok(())
    }

    fn load_checkpoint(&self, shipment_id: &str) -> RepositoryResult<Option<PackingCheckpoint>> {
        Ok(self.lock()?.checkpoints.get(shipment_id).cloned())
    }

    fn clear_checkpoint(&self, shipment_id: &str) -> RepositoryResult<()> {
        self.lock()?.checkpoints.remove(shipment_id);
        Ok(())
    }
}
