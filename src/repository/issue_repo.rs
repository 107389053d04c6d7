// ==========================================
// 仓储履约装箱系统 - 问题上报仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::issue::PackingIssue;
use crate::domain::types::IssueKind;
use crate::engine::collaborators::IssueReporter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct PackingIssueRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PackingIssueRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按上报顺序列出发运单的问题
    pub fn list_by_shipment(&self, shipment_id: &str) -> RepositoryResult<Vec<PackingIssue>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT kind, shipment_id, line_id, item_id, message
            FROM packing_issue
            WHERE shipment_id = ?1
            ORDER BY issue_id
            "#,
        )?;
        let raw = stmt
            .query_map(params![shipment_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(kind, shipment_id, line_id, item_id, message)| {
                let kind = IssueKind::parse(&kind)
                    .ok_or_else(|| RepositoryError::field_value("kind", format!("未知问题类型: {}", kind)))?;
                Ok(PackingIssue {
                    kind,
                    shipment_id,
                    line_id,
                    item_id,
                    message,
                })
            })
            .collect()
    }
}

impl IssueReporter for PackingIssueRepository {
    fn report_issue(&self, issue: &PackingIssue) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO packing_issue (shipment_id, kind, line_id, item_id, message)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                issue.shipment_id,
                issue.kind.as_str(),
                issue.line_id,
                issue.item_id,
                issue.message,
            ],
        )?;
        Ok(())
    }
}
