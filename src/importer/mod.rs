// ==========================================
// 仓储履约装箱系统 - 导入层
// ==========================================
// 职责: 外部主数据导入（装箱规则 CSV）
// ==========================================

pub mod error;
pub mod pack_rule_importer;

pub use error::{ImportError, ImportResult};
pub use pack_rule_importer::{PackRuleImportSummary, PackRuleImporter, RowRejection};
