// ==========================================
// 仓储履约装箱系统 - 引擎层错误类型
// ==========================================
// 职责: 编排过程中的非预期失败（协作方异常/数据损坏/任务中断）
// 红线: 配置缺口与缺失数据不是错误，走问题上报 + 阻断
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("协作方调用失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("断点与发运单不匹配: checkpoint={checkpoint_shipment}, shipment={shipment_id}")]
    CheckpointMismatch {
        checkpoint_shipment: String,
        shipment_id: String,
    },

    #[error("数据不一致 (shipment={shipment_id}): {message}")]
    InconsistentData { shipment_id: String, message: String },

    #[error("后台任务异常: {0}")]
    TaskJoin(String),
}

impl EngineError {
    pub fn inconsistent(shipment_id: &str, message: impl Into<String>) -> Self {
        EngineError::InconsistentData {
            shipment_id: shipment_id.to_string(),
            message: message.into(),
        }
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::TaskJoin(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
