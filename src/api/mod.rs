// ==========================================
// 仓储履约装箱系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI 调用
// ==========================================

pub mod error;
pub mod fulfillment_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use fulfillment_api::FulfillmentApi;
