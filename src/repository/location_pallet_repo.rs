// ==========================================
// 仓储履约装箱系统 - 仓库托盘配置仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约定: 未登记的仓库按 1 件/托盘；已登记但物料无配置视为缺失
// ==========================================

use crate::engine::collaborators::PalletConfigReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct LocationPalletRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LocationPalletRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn register_location(&self, location_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO location (location_id) VALUES (?1)",
            params![location_id],
        )?;
        Ok(())
    }

    /// 设置物料托盘件数（仓库未登记时一并登记）
    pub fn set_units_per_pallet(&self, location_id: &str, item_id: &str, units_per_pallet: u32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO location (location_id) VALUES (?1)",
            params![location_id],
        )?;
        conn.execute(
            r#"
            INSERT INTO location_pallet_config (location_id, item_id, units_per_pallet)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(location_id, item_id) DO UPDATE SET units_per_pallet = excluded.units_per_pallet
            "#,
            params![location_id, item_id, units_per_pallet],
        )?;
        Ok(())
    }
}

impl PalletConfigReader for LocationPalletRepository {
    fn read_location_pallet_config(&self, location_id: &str, item_id: &str) -> RepositoryResult<Option<u32>> {
        let conn = self.get_conn()?;

        let recognized = conn
            .query_row(
                "SELECT 1 FROM location WHERE location_id = ?1",
                params![location_id],
                |_row| Ok(()),
            )
            .optional()?
            .is_some();
        if !recognized {
            return Ok(Some(1));
        }

        let upp: Option<i64> = conn
            .query_row(
                "SELECT units_per_pallet FROM location_pallet_config WHERE location_id = ?1 AND item_id = ?2",
                params![location_id, item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(upp.and_then(|v| u32::try_from(v).ok()).filter(|&v| v > 0))
    }
}
