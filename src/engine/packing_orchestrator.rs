// ==========================================
// 仓储履约装箱系统 - 装箱编排器
// ==========================================
// 职责: 逐行驱动 ItemPacker，包裹即时落库，预算耗尽时写断点
// 输入: 发运单 + 明细行(含批次) + 客户装箱配置 + 生效规则集
// 输出: PackingReport（完成 / 挂起）+ 问题上报
// ==========================================
// 红线: 行内装箱串行；挂起只发生在行与行之间
// 红线: 续跑时已装数量从已提交包裹重算，绝不重复装箱
// ==========================================

mod core;
#[cfg(test)]
mod tests;

pub use self::core::{PackingBudget, PackingOrchestrator, PackingOutcome, PackingReport};
