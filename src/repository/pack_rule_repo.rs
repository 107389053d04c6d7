// ==========================================
// 仓储履约装箱系统 - 装箱规则数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 作用域优先级交给 RuleScopeResolver，这里只按物料取候选
// ==========================================

use crate::domain::pack_rule::{Dimensions, PackRule};
use crate::engine::collaborators::PackRuleReader;
use crate::engine::rule_scope::RuleScopeResolver;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct PackRuleRepository {
    conn: Arc<Mutex<Connection>>,
    resolver: RuleScopeResolver,
}

impl PackRuleRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            resolver: RuleScopeResolver::new(),
        }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量写入规则（同一事务，按唯一键 UPSERT）
    ///
    /// # 返回
    /// 写入的规则条数
    pub fn upsert_rules(&self, rules: &[PackRule]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO pack_rule (
                    item_id, threshold_quantity, package_type_id, fixed_weight,
                    length, width, height, customer_id, unit_key
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(item_id, customer_id, unit_key, threshold_quantity, package_type_id)
                DO UPDATE SET
                    fixed_weight = excluded.fixed_weight,
                    length = excluded.length,
                    width = excluded.width,
                    height = excluded.height
                "#,
            )?;
            for rule in rules {
                count += stmt.execute(params![
                    rule.item_id,
                    rule.threshold_quantity,
                    rule.package_type_id,
                    rule.fixed_weight,
                    rule.dimensions.length,
                    rule.dimensions.width,
                    rule.dimensions.height,
                    rule.customer_id.as_deref().unwrap_or(""),
                    rule.unit_key.as_deref().unwrap_or(""),
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 某物料的全部候选规则（所有作用域）
    pub fn find_by_item(&self, item_id: &str) -> RepositoryResult<Vec<PackRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT item_id, threshold_quantity, package_type_id, fixed_weight,
                   length, width, height, customer_id, unit_key
            FROM pack_rule
            WHERE item_id = ?1
            ORDER BY threshold_quantity, package_type_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![item_id], |row| {
                let customer_id: String = row.get(7)?;
                let unit_key: String = row.get(8)?;
                Ok(PackRule {
                    item_id: row.get(0)?,
                    threshold_quantity: row.get(1)?,
                    package_type_id: row.get(2)?,
                    fixed_weight: row.get(3)?,
                    dimensions: Dimensions::new(row.get(4)?, row.get(5)?, row.get(6)?),
                    customer_id: (!customer_id.is_empty()).then_some(customer_id),
                    unit_key: (!unit_key.is_empty()).then_some(unit_key),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM pack_rule", [], |row| row.get(0))?)
    }
}

impl PackRuleReader for PackRuleRepository {
    fn read_pack_rules(
        &self,
        item_id: &str,
        customer_id: Option<&str>,
        unit_key: Option<&str>,
    ) -> RepositoryResult<Vec<PackRule>> {
        let candidates = self.find_by_item(item_id)?;
        Ok(self.resolver.resolve(candidates, item_id, customer_id, unit_key))
    }
}
