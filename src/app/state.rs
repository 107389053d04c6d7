// ==========================================
// 仓储履约装箱系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::FulfillmentApi;
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::FulfillmentRepositories;

/// 应用状态
///
/// 持有共享数据库连接、仓储集合与 API 实例
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 履约API
    pub fulfillment_api: Arc<FulfillmentApi>,

    /// 仓储集合（CLI 直接查询用）
    pub repositories: FulfillmentRepositories,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并确保表结构存在
    /// 2. 初始化所有Repository
    /// 3. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库表结构初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repositories = FulfillmentRepositories::from_connection(conn.clone());

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 创建API实例
        // ==========================================
        let fulfillment_api = Arc::new(FulfillmentApi::new(repositories.clone(), config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            fulfillment_api,
            repositories,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 FULFILLMENT_PACK_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("FULFILLMENT_PACK_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fulfillment_pack.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("fulfillment-pack");
        // 确保目录存在；失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("fulfillment_pack.db");
        }
    }

    path.to_string_lossy().to_string()
}
