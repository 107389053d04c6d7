// ==========================================
// 仓储履约装箱系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::fulfillment_config_trait::{ConfigResult, FulfillmentConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::{MissingUppPolicy, PalletMode, PickupPolicy};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 解析数值配置，格式错误时回落默认值并告警
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key, value = %raw, default = %default, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 获取所有 global 配置的快照（JSON格式），随批次日志输出
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

#[async_trait]
impl FulfillmentConfigReader for ConfigManager {
    async fn get_pallet_mode(&self) -> ConfigResult<PalletMode> {
        let value = self.get_config_or_default(config_keys::PALLET_MODE, "GROUPED")?;
        Ok(PalletMode::parse(&value).unwrap_or_else(|| {
            warn!(value = %value, "未知托盘模式，使用 GROUPED");
            PalletMode::Grouped
        }))
    }

    async fn get_missing_upp_policy(&self) -> ConfigResult<MissingUppPolicy> {
        let value = self.get_config_or_default(config_keys::MISSING_UPP_POLICY, "EXCLUDE")?;
        Ok(MissingUppPolicy::parse(&value).unwrap_or_else(|| {
            warn!(value = %value, "未知缺失 UPP 策略，使用 EXCLUDE");
            MissingUppPolicy::Exclude
        }))
    }

    async fn get_pickup_policy(&self) -> ConfigResult<PickupPolicy> {
        let value = self.get_config_or_default(config_keys::PICKUP_POLICY, "WINDOW")?;
        Ok(PickupPolicy::parse(&value).unwrap_or_else(|| {
            warn!(value = %value, "未知提货策略，使用 WINDOW");
            PickupPolicy::Window
        }))
    }

    async fn get_heavy_weight_threshold_lbs(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(config_keys::HEAVY_WEIGHT_THRESHOLD_LBS, 285.0)
    }

    async fn get_pickup_lead_business_days(&self) -> ConfigResult<u32> {
        self.get_parsed_or_default(config_keys::PICKUP_LEAD_BUSINESS_DAYS, 2)
    }

    async fn get_transit_buffer_business_days(&self) -> ConfigResult<u32> {
        self.get_parsed_or_default(config_keys::TRANSIT_BUFFER_BUSINESS_DAYS, 2)
    }

    async fn get_pack_operation_budget(&self) -> ConfigResult<u32> {
        self.get_parsed_or_default(config_keys::PACK_OPERATION_BUDGET, 0)
    }

    async fn get_pack_time_budget_ms(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(config_keys::PACK_TIME_BUDGET_MS, 0)
    }

    async fn get_batch_max_workers(&self) -> ConfigResult<usize> {
        let workers = self.get_parsed_or_default(config_keys::BATCH_MAX_WORKERS, 4usize)?;
        Ok(workers.max(1))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 托盘
    pub const PALLET_MODE: &str = "pallet_mode";
    pub const MISSING_UPP_POLICY: &str = "missing_upp_policy";

    // 路由
    pub const PICKUP_POLICY: &str = "pickup_policy";
    pub const HEAVY_WEIGHT_THRESHOLD_LBS: &str = "heavy_weight_threshold_lbs";
    pub const PICKUP_LEAD_BUSINESS_DAYS: &str = "pickup_lead_business_days";
    pub const TRANSIT_BUFFER_BUSINESS_DAYS: &str = "transit_buffer_business_days";

    // 装箱预算
    pub const PACK_OPERATION_BUDGET: &str = "pack_operation_budget";
    pub const PACK_TIME_BUDGET_MS: &str = "pack_time_budget_ms";

    // 批处理
    pub const BATCH_MAX_WORKERS: &str = "batch_max_workers";
}
