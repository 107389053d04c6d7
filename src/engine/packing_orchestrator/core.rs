use crate::config::FulfillmentSettings;
use crate::domain::checkpoint::PackingCheckpoint;
use crate::domain::issue::PackingIssue;
use crate::domain::pack_rule::{sort_rules_ascending, PackRule};
use crate::domain::package::{Package, SequenceAllocator};
use crate::domain::shipment::{CustomerPackingProfile, Shipment, ShipmentLine};
use crate::engine::collaborators::FulfillmentCollaborators;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::item_packer::{ItemPacker, LinePackPolicy};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

// ==========================================
// PackingBudget - 单次切片预算
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackingBudget {
    /// 最多创建的包裹数（None = 不限）
    pub max_operations: Option<u32>,
    /// 墙钟预算（None = 不限）
    pub time_limit: Option<Duration>,
}

impl PackingBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn operations(max_operations: u32) -> Self {
        Self {
            max_operations: Some(max_operations),
            time_limit: None,
        }
    }

    pub fn from_settings(settings: &FulfillmentSettings) -> Self {
        Self {
            max_operations: settings.operation_budget(),
            time_limit: settings.time_budget(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackingOutcome {
    Completed, // 所有可装行已处理，断点已清除
    Suspended, // 预算耗尽，断点已落库
}

/// 单次装箱切片结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingReport {
    pub shipment_id: String,
    pub run_id: String,
    pub outcome: PackingOutcome,
    /// 本切片是否从断点续跑
    pub resumed: bool,
    /// 本切片创建的包裹
    pub packages_created: u32,
    pub units_packed: u64,
    pub package_ids: Vec<String>,
    /// 本切片新上报的问题
    pub issues: Vec<PackingIssue>,
    /// 本次运行中仍处于部分装箱状态的行
    pub partial_line_ids: Vec<String>,
}

impl PackingReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == PackingOutcome::Completed
    }
}

// ==========================================
// PackingOrchestrator - 装箱编排器
// ==========================================
pub struct PackingOrchestrator {
    collaborators: FulfillmentCollaborators,
    packer: ItemPacker,
    budget: PackingBudget,
}

impl PackingOrchestrator {
    pub fn new(collaborators: FulfillmentCollaborators, budget: PackingBudget) -> Self {
        Self {
            collaborators,
            packer: ItemPacker::new(),
            budget,
        }
    }

    /// 续跑：沿用断点的 run_id；无断点时按新运行处理
    pub fn resume_shipment(&self, shipment_id: &str) -> EngineResult<PackingReport> {
        let run_id = match self.collaborators.checkpoints.load_checkpoint(shipment_id)? {
            Some(checkpoint) => checkpoint.run_id,
            None => {
                info!(shipment_id, "无装箱断点，按新运行处理");
                uuid::Uuid::new_v4().to_string()
            }
        };
        self.pack_shipment(shipment_id, &run_id)
    }

    /// 装箱一个发运单（一个预算切片）
    ///
    /// # 流程
    /// 1. 读取发运单/明细行/已提交包裹/断点
    /// 2. 按已提交包裹重算各行及批次已装数量
    /// 3. 从第一条未装满且本次运行未跳过的行开始逐行装箱
    /// 4. 下一行的包裹数会超出预算时写断点挂起；全部处理完清除断点
    #[instrument(skip(self), fields(budget = ?self.budget.max_operations))]
    pub fn pack_shipment(&self, shipment_id: &str, run_id: &str) -> EngineResult<PackingReport> {
        let started = Instant::now();
        let deadline = self.budget.time_limit.map(|limit| started + limit);

        let shipment = self.collaborators.shipments.read_shipment(shipment_id)?;
        let mut lines = self.collaborators.shipments.read_shipment_lines(shipment_id)?;

        // ===== 断点 =====
        let existing_checkpoint = self.collaborators.checkpoints.load_checkpoint(shipment_id)?;
        let resumed = existing_checkpoint.is_some();
        let mut checkpoint = match existing_checkpoint {
            Some(cp) => {
                if cp.shipment_id != shipment_id {
                    return Err(EngineError::CheckpointMismatch {
                        checkpoint_shipment: cp.shipment_id,
                        shipment_id: shipment_id.to_string(),
                    });
                }
                if cp.cursor > lines.len() {
                    return Err(EngineError::inconsistent(
                        shipment_id,
                        format!("断点游标 {} 超出明细行数 {}", cp.cursor, lines.len()),
                    ));
                }
                if cp.run_id != run_id {
                    info!(checkpoint_run = %cp.run_id, "沿用断点所属运行继续装箱");
                }
                cp
            }
            None => PackingCheckpoint::new(shipment_id, run_id),
        };

        // ===== 已提交包裹 → 已装数量 =====
        let committed = self.collaborators.packages.list_packages(shipment_id)?;
        let mut allocator = SequenceAllocator::from_existing(committed.iter().map(|p| p.sequence_index));
        Self::reconcile_packed_quantities(shipment_id, &mut lines, &committed);

        let policy = self.load_policy(&shipment)?;
        let mut rule_cache: HashMap<(String, Option<String>), Vec<PackRule>> = HashMap::new();

        let mut report = PackingReport {
            shipment_id: shipment_id.to_string(),
            run_id: checkpoint.run_id.clone(),
            outcome: PackingOutcome::Completed,
            resumed,
            packages_created: 0,
            units_packed: 0,
            package_ids: Vec::new(),
            issues: Vec::new(),
            partial_line_ids: Vec::new(),
        };

        info!(
            lines = lines.len(),
            committed_packages = committed.len(),
            resumed,
            "开始装箱"
        );

        for idx in 0..lines.len() {
            if lines[idx].is_fully_packed() || checkpoint.is_skipped(&lines[idx].line_id) {
                continue;
            }

            if let Some(deadline) = deadline {
                if report.packages_created > 0 && Instant::now() >= deadline {
                    info!(cursor = idx, "墙钟预算耗尽，挂起装箱");
                    return self.suspend(checkpoint, idx, report);
                }
            }

            let rules = self.rules_for(&mut rule_cache, &shipment, &lines[idx])?;
            let mut working = lines[idx].clone();
            let result = self.packer.pack_line(shipment_id, &mut working, &rules, policy);

            if let Some(max) = self.budget.max_operations {
                let needed = result.packages.len() as u32;
                if needed > 0 && report.packages_created > 0 && report.packages_created + needed > max {
                    info!(
                        cursor = idx,
                        used = report.packages_created,
                        needed,
                        max,
                        "操作预算不足以装下一行，挂起装箱"
                    );
                    return self.suspend(checkpoint, idx, report);
                }
            }

            for mut package in result.packages {
                package.sequence_index = allocator.allocate();
                let package_id = self.collaborators.packages.create_package(&package)?;
                debug!(
                    package_id = %package_id,
                    sequence_index = package.sequence_index,
                    quantity = package.quantity,
                    "包裹已落库"
                );
                report.packages_created += 1;
                report.package_ids.push(package_id);
            }
            report.units_packed += u64::from(result.packed_units);

            if let Some(issue) = result.issue {
                warn!(line_id = %working.line_id, kind = %issue.kind, "明细行标记部分装箱");
                self.collaborators.issues.report_issue(&issue)?;
                report.issues.push(issue);
            }
            if result.leftover_units > 0 {
                checkpoint.skipped_line_ids.push(working.line_id.clone());
            }

            lines[idx] = working;
            checkpoint.cursor = idx + 1;
        }

        self.collaborators.checkpoints.clear_checkpoint(shipment_id)?;
        report.partial_line_ids = checkpoint.skipped_line_ids;

        info!(
            packages_created = report.packages_created,
            units_packed = report.units_packed,
            partial_lines = report.partial_line_ids.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "装箱完成"
        );

        Ok(report)
    }

    /// 写断点并返回挂起结果
    fn suspend(
        &self,
        mut checkpoint: PackingCheckpoint,
        cursor: usize,
        mut report: PackingReport,
    ) -> EngineResult<PackingReport> {
        checkpoint.cursor = cursor;
        checkpoint.packages_created += report.packages_created;
        checkpoint.units_packed += report.units_packed;
        checkpoint.package_ids.extend(report.package_ids.iter().cloned());
        checkpoint.updated_at = Utc::now();
        self.collaborators.checkpoints.save_checkpoint(&checkpoint)?;

        report.outcome = PackingOutcome::Suspended;
        report.partial_line_ids = checkpoint.skipped_line_ids;
        Ok(report)
    }

    fn load_policy(&self, shipment: &Shipment) -> EngineResult<LinePackPolicy> {
        let profile = match shipment.customer_id.as_deref() {
            Some(customer_id) => self
                .collaborators
                .shipments
                .read_customer_profile(customer_id)?
                .unwrap_or_else(|| CustomerPackingProfile::default_for(customer_id)),
            None => return Ok(LinePackPolicy::default()),
        };
        Ok(LinePackPolicy::from(&profile))
    }

    /// 生效规则集（同一物料+单位在一次切片内只读一次）
    fn rules_for(
        &self,
        cache: &mut HashMap<(String, Option<String>), Vec<PackRule>>,
        shipment: &Shipment,
        line: &ShipmentLine,
    ) -> EngineResult<Vec<PackRule>> {
        let key = (line.item_id.clone(), line.unit_key.clone());
        if let Some(rules) = cache.get(&key) {
            return Ok(rules.clone());
        }
        let mut rules = self.collaborators.rules.read_pack_rules(
            &line.item_id,
            shipment.customer_id.as_deref(),
            line.unit_key.as_deref(),
        )?;
        sort_rules_ascending(&mut rules);
        cache.insert(key, rules.clone());
        Ok(rules)
    }

    /// 已装数量 = 记录值（外部已装基线）+ 已提交包裹合计，并截断到订购/已拣数量
    ///
    /// 记录值只来自外部系统，本系统从不回写，两者不会重复计数
    fn reconcile_packed_quantities(shipment_id: &str, lines: &mut [ShipmentLine], committed: &[Package]) {
        if committed.is_empty() {
            return;
        }

        for line in lines.iter_mut() {
            let from_packages: u32 = committed.iter().map(|p| p.quantity_for_line(&line.line_id)).sum();
            let derived = line.packed_quantity.saturating_add(from_packages);
            if derived > line.ordered_quantity {
                warn!(
                    shipment_id,
                    line_id = %line.line_id,
                    baseline = line.packed_quantity,
                    from_packages,
                    ordered = line.ordered_quantity,
                    "已装数量超过订购数量"
                );
            }
            line.packed_quantity = derived.min(line.ordered_quantity);

            for lot in line.lots.iter_mut() {
                let lot_packed: u32 = committed
                    .iter()
                    .map(|p| p.quantity_for_lot(&line.line_id, &lot.lot_id))
                    .sum();
                lot.packed_quantity = lot.packed_quantity.saturating_add(lot_packed).min(lot.picked_quantity);
            }
        }
    }
}
