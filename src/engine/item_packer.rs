// ==========================================
// 仓储履约装箱系统 - 单行装箱引擎
// ==========================================
// 职责: 把一条明细行的剩余数量（或各批次剩余）拆成包裹方案
// 输入: 明细行 + 生效规则集 + 客户装箱策略
// 输出: 包裹列表（未分配序号）+ 更新后的内存计数
// ==========================================
// 红线: 无规则 / 客户要求人工完成部分装箱 → 零包裹 + 标记，不影响其他行
// 红线: Σ包裹数量 + 未装余量 == 订购数量
// ==========================================

mod core;


pub use self::core::{ItemPacker, LinePackPolicy, LinePackResult};
