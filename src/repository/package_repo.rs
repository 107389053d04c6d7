// ==========================================
// 仓储履约装箱系统 - 包裹数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 单个包裹（头 + 内容）在一个事务内落库
// ==========================================

use crate::domain::pack_rule::Dimensions;
use crate::domain::package::{Package, PackageContent};
use crate::engine::collaborators::PackageStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct PackageRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PackageRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn load_contents(conn: &Connection, shipment_id: &str) -> RepositoryResult<HashMap<String, Vec<PackageContent>>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT c.package_id, c.line_id, c.item_id, c.quantity, c.lot_id
            FROM package_content c
            JOIN package p ON p.package_id = c.package_id
            WHERE p.shipment_id = ?1
            ORDER BY c.package_id, c.content_no
            "#,
        )?;
        let rows = stmt.query_map(params![shipment_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                PackageContent {
                    line_id: row.get(1)?,
                    item_id: row.get(2)?,
                    quantity: row.get(3)?,
                    lot_id: row.get(4)?,
                },
            ))
        })?;

        let mut by_package: HashMap<String, Vec<PackageContent>> = HashMap::new();
        for row in rows {
            let (package_id, content) = row?;
            by_package.entry(package_id).or_default().push(content);
        }
        Ok(by_package)
    }
}

impl PackageStore for PackageRepository {
    fn list_packages(&self, shipment_id: &str) -> RepositoryResult<Vec<Package>> {
        let conn = self.get_conn()?;
        let mut contents = Self::load_contents(&conn, shipment_id)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT package_id, shipment_id, sequence_index, quantity, package_type_id,
                   weight, length, width, height
            FROM package
            WHERE shipment_id = ?1
            ORDER BY sequence_index
            "#,
        )?;
        let headers = stmt
            .query_map(params![shipment_id], |row| {
                Ok(Package {
                    package_id: Some(row.get(0)?),
                    shipment_id: row.get(1)?,
                    sequence_index: row.get(2)?,
                    quantity: row.get(3)?,
                    package_type_id: row.get(4)?,
                    weight: row.get(5)?,
                    dimensions: Dimensions::new(row.get(6)?, row.get(7)?, row.get(8)?),
                    contents: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(headers
            .into_iter()
            .map(|mut package| {
                if let Some(id) = package.package_id.as_deref() {
                    package.contents = contents.remove(id).unwrap_or_default();
                }
                package
            })
            .collect())
    }

    fn create_package(&self, package: &Package) -> RepositoryResult<String> {
        if package.contents.is_empty() {
            return Err(RepositoryError::ValidationError("包裹内容不能为空".to_string()));
        }
        if package.sequence_index == 0 {
            return Err(RepositoryError::field_value("sequence_index", "包裹序号未分配"));
        }

        let package_id = Uuid::new_v4().to_string();
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO package (
                package_id, shipment_id, sequence_index, quantity, package_type_id,
                weight, length, width, height
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                package_id,
                package.shipment_id,
                package.sequence_index,
                package.quantity,
                package.package_type_id,
                package.weight,
                package.dimensions.length,
                package.dimensions.width,
                package.dimensions.height,
            ],
        )?;

        for (content_no, content) in package.contents.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO package_content (package_id, content_no, line_id, item_id, quantity, lot_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    package_id,
                    content_no as i64,
                    content.line_id,
                    content.item_id,
                    content.quantity,
                    content.lot_id,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(package_id)
    }
}
