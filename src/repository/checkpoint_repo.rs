// ==========================================
// 仓储履约装箱系统 - 装箱断点仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储: 每个发运单至多一条断点，内容为 JSON
// ==========================================

use crate::domain::checkpoint::PackingCheckpoint;
use crate::engine::collaborators::CheckpointStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct CheckpointRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CheckpointRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl CheckpointStore for CheckpointRepository {
    fn save_checkpoint(&self, checkpoint: &PackingCheckpoint) -> RepositoryResult<()> {
        let json = serde_json::to_string(checkpoint)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO packing_checkpoint (shipment_id, run_id, checkpoint_json, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(shipment_id) DO UPDATE SET
                run_id = excluded.run_id,
                checkpoint_json = excluded.checkpoint_json,
                updated_at = excluded.updated_at
            "#,
            params![
                checkpoint.shipment_id,
                checkpoint.run_id,
                json,
                checkpoint.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load_checkpoint(&self, shipment_id: &str) -> RepositoryResult<Option<PackingCheckpoint>> {
        let conn = self.get_conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT checkpoint_json FROM packing_checkpoint WHERE shipment_id = ?1",
                params![shipment_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn clear_checkpoint(&self, shipment_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM packing_checkpoint WHERE shipment_id = ?1",
            params![shipment_id],
        )?;
        Ok(())
    }
}
