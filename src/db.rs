// ==========================================
// 仓储履约装箱系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 建表幂等，CLI `init-db` 与各入口共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）并记录 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

// 作用域键用 '' 表示“未限定”，保证 UNIQUE 约束可用（NULL 互不相等）
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS customer_packing_profile (
    customer_id TEXT PRIMARY KEY,
    partial_pack_allowed INTEGER NOT NULL DEFAULT 1,
    manual_partial_pack INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS shipment (
    shipment_id TEXT PRIMARY KEY,
    customer_id TEXT,
    location_id TEXT NOT NULL,
    mabd TEXT,
    cartons INTEGER,
    volume REAL,
    weight REAL,
    pallet_count INTEGER,
    request_type INTEGER,
    pickup_date TEXT,
    routing_status TEXT,
    issue_text TEXT,
    failed_reason TEXT,
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS shipment_line (
    shipment_id TEXT NOT NULL REFERENCES shipment(shipment_id) ON DELETE CASCADE,
    line_id TEXT NOT NULL,
    line_no INTEGER NOT NULL,
    item_id TEXT NOT NULL,
    unit_key TEXT,
    ordered_quantity INTEGER NOT NULL CHECK (ordered_quantity >= 0),
    packed_quantity INTEGER NOT NULL DEFAULT 0 CHECK (packed_quantity >= 0),
    units_per_carton INTEGER,
    cubic_feet_per_carton REAL,
    weight_per_carton REAL,
    units_per_pallet INTEGER,
    PRIMARY KEY (shipment_id, line_id)
);

CREATE TABLE IF NOT EXISTS lot_assignment (
    shipment_id TEXT NOT NULL,
    line_id TEXT NOT NULL,
    lot_id TEXT NOT NULL,
    lot_no INTEGER NOT NULL,
    picked_quantity INTEGER NOT NULL CHECK (picked_quantity >= 0),
    packed_quantity INTEGER NOT NULL DEFAULT 0 CHECK (packed_quantity >= 0),
    expiration TEXT,
    PRIMARY KEY (shipment_id, line_id, lot_id),
    FOREIGN KEY (shipment_id, line_id) REFERENCES shipment_line(shipment_id, line_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS pack_rule (
    rule_id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL,
    threshold_quantity INTEGER NOT NULL,
    package_type_id TEXT NOT NULL,
    fixed_weight REAL NOT NULL DEFAULT 0,
    length REAL NOT NULL DEFAULT 0,
    width REAL NOT NULL DEFAULT 0,
    height REAL NOT NULL DEFAULT 0,
    customer_id TEXT NOT NULL DEFAULT '',
    unit_key TEXT NOT NULL DEFAULT '',
    UNIQUE (item_id, customer_id, unit_key, threshold_quantity, package_type_id)
);
CREATE INDEX IF NOT EXISTS idx_pack_rule_item ON pack_rule(item_id);

CREATE TABLE IF NOT EXISTS location (
    location_id TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS location_pallet_config (
    location_id TEXT NOT NULL REFERENCES location(location_id) ON DELETE CASCADE,
    item_id TEXT NOT NULL,
    units_per_pallet INTEGER NOT NULL,
    PRIMARY KEY (location_id, item_id)
);

CREATE TABLE IF NOT EXISTS package (
    package_id TEXT PRIMARY KEY,
    shipment_id TEXT NOT NULL REFERENCES shipment(shipment_id) ON DELETE CASCADE,
    sequence_index INTEGER NOT NULL CHECK (sequence_index > 0),
    quantity INTEGER NOT NULL,
    package_type_id TEXT NOT NULL,
    weight REAL NOT NULL,
    length REAL NOT NULL DEFAULT 0,
    width REAL NOT NULL DEFAULT 0,
    height REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (shipment_id, sequence_index)
);

CREATE TABLE IF NOT EXISTS package_content (
    package_id TEXT NOT NULL REFERENCES package(package_id) ON DELETE CASCADE,
    content_no INTEGER NOT NULL,
    line_id TEXT NOT NULL,
    item_id TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    lot_id TEXT,
    PRIMARY KEY (package_id, content_no)
);

CREATE TABLE IF NOT EXISTS packing_issue (
    issue_id INTEGER PRIMARY KEY AUTOINCREMENT,
    shipment_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    line_id TEXT,
    item_id TEXT,
    message TEXT NOT NULL,
    reported_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_packing_issue_shipment ON packing_issue(shipment_id);

CREATE TABLE IF NOT EXISTS packing_checkpoint (
    shipment_id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL,
    checkpoint_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
