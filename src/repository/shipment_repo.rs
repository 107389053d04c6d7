// ==========================================
// 仓储履约装箱系统 - 发运单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: shipment / shipment_line / lot_assignment / customer_packing_profile
// 说明: 行记录在此处完成强类型校验（负数量、非法日期）
// ==========================================

use crate::domain::routing::ShipmentFieldUpdate;
use crate::domain::shipment::{CustomerPackingProfile, LotAssignment, Shipment, ShipmentLine};
use crate::domain::types::{RequestType, RoutingStatus};
use crate::engine::collaborators::{ShipmentReader, ShipmentWriter};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// ShipmentRepository - 发运单仓储
// ==========================================
pub struct ShipmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShipmentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入发运单及其明细行/批次（整体替换明细）
    pub fn upsert_shipment(&self, shipment: &Shipment, lines: &[ShipmentLine]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO shipment (shipment_id, customer_id, location_id, mabd)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(shipment_id) DO UPDATE SET
                customer_id = excluded.customer_id,
                location_id = excluded.location_id,
                mabd = excluded.mabd
            "#,
            params![
                shipment.shipment_id,
                shipment.customer_id,
                shipment.location_id,
                shipment.mabd.map(|d| d.format(DATE_FORMAT).to_string()),
            ],
        )?;

        tx.execute(
            "DELETE FROM shipment_line WHERE shipment_id = ?1",
            params![shipment.shipment_id],
        )?;

        for (line_no, line) in lines.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO shipment_line (
                    shipment_id, line_id, line_no, item_id, unit_key,
                    ordered_quantity, packed_quantity,
                    units_per_carton, cubic_feet_per_carton, weight_per_carton, units_per_pallet
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    shipment.shipment_id,
                    line.line_id,
                    line_no as i64,
                    line.item_id,
                    line.unit_key,
                    line.ordered_quantity,
                    line.packed_quantity,
                    line.units_per_carton,
                    line.cubic_feet_per_carton,
                    line.weight_per_carton,
                    line.units_per_pallet,
                ],
            )?;

            for (lot_no, lot) in line.lots.iter().enumerate() {
                tx.execute(
                    r#"
                    INSERT INTO lot_assignment (
                        shipment_id, line_id, lot_id, lot_no,
                        picked_quantity, packed_quantity, expiration
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    params![
                        shipment.shipment_id,
                        line.line_id,
                        lot.lot_id,
                        lot_no as i64,
                        lot.picked_quantity,
                        lot.packed_quantity,
                        lot.expiration.map(|d| d.format(DATE_FORMAT).to_string()),
                    ],
                )?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    pub fn upsert_customer_profile(&self, profile: &CustomerPackingProfile) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO customer_packing_profile (customer_id, partial_pack_allowed, manual_partial_pack)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(customer_id) DO UPDATE SET
                partial_pack_allowed = excluded.partial_pack_allowed,
                manual_partial_pack = excluded.manual_partial_pack
            "#,
            params![
                profile.customer_id,
                profile.partial_pack_allowed,
                profile.manual_partial_pack
            ],
        )?;
        Ok(())
    }

    /// 全部发运单ID（按ID排序）
    pub fn list_shipment_ids(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT shipment_id FROM shipment ORDER BY shipment_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// 读取最近一次路由回写结果（未路由返回 None）
    pub fn find_field_update(&self, shipment_id: &str) -> RepositoryResult<Option<ShipmentFieldUpdate>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT cartons, volume, weight, pallet_count, request_type,
                       pickup_date, routing_status, issue_text
                FROM shipment
                WHERE shipment_id = ?1 AND routing_status IS NOT NULL
                "#,
                params![shipment_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i32>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((cartons, volume, weight, pallets, request_code, pickup, status, issue_text)) = row else {
            return Ok(None);
        };

        Ok(Some(ShipmentFieldUpdate {
            cartons: non_negative("cartons", cartons)?,
            volume,
            weight,
            pallet_count: non_negative("pallet_count", pallets)?,
            request_type: RequestType::from_code(request_code).ok_or_else(|| {
                RepositoryError::field_value("request_type", format!("未知申请类型: {}", request_code))
            })?,
            pickup_date: pickup.as_deref().map(|s| parse_date("pickup_date", s)).transpose()?,
            routing_status: RoutingStatus::parse(&status).ok_or_else(|| {
                RepositoryError::field_value("routing_status", format!("未知路由状态: {}", status))
            })?,
            issue_text,
        }))
    }

    /// 读取失败原因（未失败返回 None）
    pub fn find_failed_reason(&self, shipment_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let reason = conn
            .query_row(
                "SELECT failed_reason FROM shipment WHERE shipment_id = ?1",
                params![shipment_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(reason.flatten())
    }

    fn load_lots(conn: &Connection, shipment_id: &str, line_id: &str) -> RepositoryResult<Vec<LotAssignment>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT lot_id, picked_quantity, packed_quantity, expiration
            FROM lot_assignment
            WHERE shipment_id = ?1 AND line_id = ?2
            ORDER BY lot_no
            "#,
        )?;
        let raw = stmt
            .query_map(params![shipment_id, line_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(lot_id, picked, packed, expiration)| {
                let lot = LotAssignment {
                    lot_id,
                    picked_quantity: quantity("picked_quantity", picked)?,
                    packed_quantity: quantity("lot.packed_quantity", packed)?,
                    expiration: expiration.as_deref().map(|s| parse_date("expiration", s)).transpose()?,
                };
                if lot.packed_quantity > lot.picked_quantity {
                    return Err(RepositoryError::ValidationError(format!(
                        "批次 {} 已装数量 {} 超过已拣数量 {}",
                        lot.lot_id, lot.packed_quantity, lot.picked_quantity
                    )));
                }
                Ok(lot)
            })
            .collect()
    }
}

impl ShipmentReader for ShipmentRepository {
    fn read_shipment(&self, shipment_id: &str) -> RepositoryResult<Shipment> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT shipment_id, customer_id, location_id, mabd FROM shipment WHERE shipment_id = ?1",
                params![shipment_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((shipment_id, customer_id, location_id, mabd)) = row else {
            return Err(RepositoryError::not_found("Shipment", shipment_id));
        };

        Ok(Shipment {
            shipment_id,
            customer_id,
            location_id,
            mabd: mabd.as_deref().map(|s| parse_date("mabd", s)).transpose()?,
        })
    }

    fn read_shipment_lines(&self, shipment_id: &str) -> RepositoryResult<Vec<ShipmentLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT line_id, item_id, unit_key, ordered_quantity, packed_quantity,
                   units_per_carton, cubic_feet_per_carton, weight_per_carton, units_per_pallet
            FROM shipment_line
            WHERE shipment_id = ?1
            ORDER BY line_no
            "#,
        )?;
        let raw = stmt
            .query_map(params![shipment_id], map_line_row)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        let mut lines = Vec::with_capacity(raw.len());
        for row in raw {
            let mut line = row.into_line()?;
            line.lots = Self::load_lots(&conn, shipment_id, &line.line_id)?;
            lines.push(line);
        }
        Ok(lines)
    }

    fn read_customer_profile(&self, customer_id: &str) -> RepositoryResult<Option<CustomerPackingProfile>> {
        let conn = self.get_conn()?;
        let profile = conn
            .query_row(
                r#"
                SELECT customer_id, partial_pack_allowed, manual_partial_pack
                FROM customer_packing_profile
                WHERE customer_id = ?1
                "#,
                params![customer_id],
                |row| {
                    Ok(CustomerPackingProfile {
                        customer_id: row.get(0)?,
                        partial_pack_allowed: row.get(1)?,
                        manual_partial_pack: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }
}

impl ShipmentWriter for ShipmentRepository {
    fn update_shipment_fields(&self, shipment_id: &str, update: &ShipmentFieldUpdate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE shipment SET
                cartons = ?2, volume = ?3, weight = ?4, pallet_count = ?5,
                request_type = ?6, pickup_date = ?7, routing_status = ?8, issue_text = ?9,
                failed_reason = NULL, updated_at = ?10
            WHERE shipment_id = ?1
            "#,
            params![
                shipment_id,
                update.cartons as i64,
                update.volume,
                update.weight,
                update.pallet_count as i64,
                update.request_type.code(),
                update.pickup_date.map(|d| d.format(DATE_FORMAT).to_string()),
                update.routing_status.as_str(),
                update.issue_text,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Shipment", shipment_id));
        }
        Ok(())
    }

    fn mark_failed(&self, shipment_id: &str, reason: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE shipment SET failed_reason = ?2, updated_at = ?3 WHERE shipment_id = ?1",
            params![shipment_id, reason, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

// ==========================================
// 行映射与字段校验
// ==========================================

struct LineRow {
    line_id: String,
    item_id: String,
    unit_key: Option<String>,
    ordered_quantity: i64,
    packed_quantity: i64,
    units_per_carton: Option<i64>,
    cubic_feet_per_carton: Option<f64>,
    weight_per_carton: Option<f64>,
    units_per_pallet: Option<i64>,
}

fn map_line_row(row: &Row<'_>) -> rusqlite::Result<LineRow> {
    Ok(LineRow {
        line_id: row.get(0)?,
        item_id: row.get(1)?,
        unit_key: row.get(2)?,
        ordered_quantity: row.get(3)?,
        packed_quantity: row.get(4)?,
        units_per_carton: row.get(5)?,
        cubic_feet_per_carton: row.get(6)?,
        weight_per_carton: row.get(7)?,
        units_per_pallet: row.get(8)?,
    })
}

impl LineRow {
    fn into_line(self) -> RepositoryResult<ShipmentLine> {
        let ordered_quantity = quantity("ordered_quantity", self.ordered_quantity)?;
        let packed_quantity = quantity("packed_quantity", self.packed_quantity)?;
        if packed_quantity > ordered_quantity {
            return Err(RepositoryError::ValidationError(format!(
                "明细行 {} 已装数量 {} 超过订购数量 {}",
                self.line_id, packed_quantity, ordered_quantity
            )));
        }

        Ok(ShipmentLine {
            line_id: self.line_id,
            item_id: self.item_id,
            unit_key: self.unit_key.filter(|k| !k.is_empty()),
            ordered_quantity,
            packed_quantity,
            // 负值/溢出视为缺失
            units_per_carton: self.units_per_carton.and_then(|v| u32::try_from(v).ok()),
            cubic_feet_per_carton: self.cubic_feet_per_carton,
            weight_per_carton: self.weight_per_carton,
            units_per_pallet: self.units_per_pallet.and_then(|v| u32::try_from(v).ok()),
            lots: Vec::new(),
        })
    }
}

fn quantity(field: &str, value: i64) -> RepositoryResult<u32> {
    u32::try_from(value).map_err(|_| RepositoryError::field_value(field, format!("数量非法: {}", value)))
}

fn non_negative(field: &str, value: i64) -> RepositoryResult<u64> {
    u64::try_from(value).map_err(|_| RepositoryError::field_value(field, format!("数值非法: {}", value)))
}

fn parse_date(field: &str, value: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| RepositoryError::field_value(field, format!("日期格式错误 '{}': {}", value, e)))
}
