// ==========================================
// 仓储履约装箱系统 - 包裹领域模型
// ==========================================
// 职责: Package / PackageContent / 序号分配
// 红线: sequence_index 在发运单内唯一，先补空位再追加
// ==========================================

use crate::domain::pack_rule::Dimensions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 包裹内容（一个包裹至少一条）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageContent {
    pub line_id: String,
    pub item_id: String,
    pub quantity: u32,
    pub lot_id: Option<String>,
}

// ==========================================
// Package - 包裹
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub package_id: Option<String>, // 落库后回填
    pub shipment_id: String,
    pub sequence_index: u32,        // 0 = 尚未分配
    pub quantity: u32,
    pub package_type_id: String,
    pub weight: f64,
    pub dimensions: Dimensions,
    pub contents: Vec<PackageContent>,
}

impl Package {
    /// 某明细行在本包裹内的数量
    pub fn quantity_for_line(&self, line_id: &str) -> u32 {
        self.contents
            .iter()
            .filter(|c| c.line_id == line_id)
            .map(|c| c.quantity)
            .sum()
    }

    /// 某明细行某批次在本包裹内的数量
    pub fn quantity_for_lot(&self, line_id: &str, lot_id: &str) -> u32 {
        self.contents
            .iter()
            .filter(|c| c.line_id == line_id && c.lot_id.as_deref() == Some(lot_id))
            .map(|c| c.quantity)
            .sum()
    }
}

// ==========================================
// SequenceAllocator - 包裹序号分配器
// ==========================================
/// 从 1 开始，优先填补已有序号中的空位
#[derive(Debug, Clone, Default)]
pub struct SequenceAllocator {
    used: BTreeSet<u32>,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由已提交包裹的序号构造
    pub fn from_existing<I>(indices: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            used: indices.into_iter().filter(|&i| i > 0).collect(),
        }
    }

    /// 取下一个序号并占用
    pub fn allocate(&mut self) -> u32 {
        let mut candidate = 1;
        for &used in &self.used {
            if used != candidate {
                break;
            }
            candidate += 1;
        }
        self.used.insert(candidate);
        candidate
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
