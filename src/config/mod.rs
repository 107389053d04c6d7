// ==========================================
// 仓储履约装箱系统 - 配置层
// ==========================================
// 职责: 系统配置管理（托盘模式/缺失 UPP 策略/提货策略/预算等）
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod fulfillment_config_trait;
pub mod settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use fulfillment_config_trait::{ConfigResult, FulfillmentConfigReader};
pub use settings::FulfillmentSettings;
