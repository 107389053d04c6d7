// ==========================================
// 仓储履约装箱系统 - 装箱规则导入器
// ==========================================
// 职责: CSV → PackRule → pack_rule 表
// 流程: 读取表头 → 逐行映射校验 → 合法行批量 UPSERT
// 红线: 非法行不入库，但必须带行号输出原因
// ==========================================

use crate::domain::pack_rule::{Dimensions, PackRule};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::PackRuleRepository;
use csv::ReaderBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 必需列
pub const REQUIRED_COLUMNS: [&str; 4] = ["item_id", "threshold_quantity", "package_type_id", "fixed_weight"];

/// 可选列（尺寸缺省为 0，作用域缺省为全局）
pub const OPTIONAL_COLUMNS: [&str; 5] = ["length", "width", "height", "customer_id", "unit_key"];

#[derive(Debug, Clone, Serialize)]
pub struct RowRejection {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackRuleImportSummary {
    pub batch_id: String,
    pub total_rows: usize,
    pub imported: usize,
    pub rejected: Vec<RowRejection>,
}

impl PackRuleImportSummary {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ==========================================
// PackRuleImporter
// ==========================================
pub struct PackRuleImporter {
    repo: Arc<PackRuleRepository>,
}

impl PackRuleImporter {
    pub fn new(repo: Arc<PackRuleRepository>) -> Self {
        Self { repo }
    }

    /// 从 CSV 文件导入
    #[instrument(skip_all)]
    pub fn import_from_csv<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<PackRuleImportSummary> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
            }
        }

        info!(path = %path.display(), "开始导入装箱规则");
        let file = File::open(path)?;
        self.import_from_reader(file)
    }

    /// 从任意 Reader 导入（测试与管道输入）
    pub fn import_from_reader<R: std::io::Read>(&self, reader: R) -> ImportResult<PackRuleImportSummary> {
        let batch_id = Uuid::new_v4().to_string();
        let records = parse_raw_records(reader)?;

        let mut rules = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();
        for (row_number, row) in &records {
            match map_pack_rule(row, *row_number) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    warn!(row = *row_number, error = %e, "装箱规则行被拒绝");
                    rejected.push(RowRejection {
                        row: *row_number,
                        message: e.to_string(),
                    });
                }
            }
        }

        let imported = if rules.is_empty() { 0 } else { self.repo.upsert_rules(&rules)? };

        info!(
            batch_id = %batch_id,
            total = records.len(),
            imported,
            rejected = rejected.len(),
            "装箱规则导入完成"
        );

        Ok(PackRuleImportSummary {
            batch_id,
            total_rows: records.len(),
            imported,
            rejected,
        })
    }
}

// ==========================================
// 解析与映射
// ==========================================

/// 读取为 (行号, 列名 → 值)；行号从 2 开始（第 1 行为表头）
fn parse_raw_records<R: std::io::Read>(reader: R) -> ImportResult<Vec<(usize, HashMap<String, String>)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ImportError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.trim().to_string()))
            .collect();

        // 跳过完全空白的行
        if row.values().all(|v| v.is_empty()) {
            continue;
        }
        records.push((idx + 2, row));
    }
    Ok(records)
}

fn map_pack_rule(row: &HashMap<String, String>, row_number: usize) -> ImportResult<PackRule> {
    let item_id = required_string(row, "item_id", row_number)?;
    let package_type_id = required_string(row, "package_type_id", row_number)?;

    let threshold_quantity: u32 = parse_field(row, "threshold_quantity", row_number)?.unwrap_or(0);
    if threshold_quantity == 0 {
        return Err(ImportError::FieldMappingError {
            row: row_number,
            message: "threshold_quantity 必须大于 0".to_string(),
        });
    }

    let fixed_weight = non_negative(row, "fixed_weight", row_number)?;
    let dimensions = Dimensions::new(
        non_negative(row, "length", row_number)?,
        non_negative(row, "width", row_number)?,
        non_negative(row, "height", row_number)?,
    );

    Ok(PackRule {
        item_id,
        threshold_quantity,
        package_type_id,
        fixed_weight,
        dimensions,
        customer_id: optional_string(row, "customer_id"),
        unit_key: optional_string(row, "unit_key"),
    })
}

fn optional_string(row: &HashMap<String, String>, field: &str) -> Option<String> {
    row.get(field).filter(|v| !v.is_empty()).cloned()
}

fn required_string(row: &HashMap<String, String>, field: &str, row_number: usize) -> ImportResult<String> {
    optional_string(row, field).ok_or_else(|| ImportError::FieldMappingError {
        row: row_number,
        message: format!("{} 为空", field),
    })
}

fn parse_field<T>(row: &HashMap<String, String>, field: &str, row_number: usize) -> ImportResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_string(row, field) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| ImportError::TypeConversionError {
            row: row_number,
            field: field.to_string(),
            message: format!("{} ({})", e, raw),
        }),
    }
}

fn non_negative(row: &HashMap<String, String>, field: &str, row_number: usize) -> ImportResult<f64> {
    let value: f64 = parse_field(row, field, row_number)?.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(ImportError::TypeConversionError {
            row: row_number,
            field: field.to_string(),
            message: format!("必须为非负数，实际 {}", value),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::Builder;

    fn setup_importer() -> (PackRuleImporter, Arc<PackRuleRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let repo = Arc::new(PackRuleRepository::from_connection(Arc::new(Mutex::new(conn))));
        (PackRuleImporter::new(repo.clone()), repo)
    }

    #[test]
    fn test_import_valid_rules_with_scopes() {
        let (importer, repo) = setup_importer();
        let csv = "\
item_id,threshold_quantity,package_type_id,fixed_weight,length,width,height,customer_id,unit_key
ITEM-A,12,BOX12,1.5,12,10,8,,
ITEM-A,24,BOX24,2.0,16,12,10,,
ITEM-A,6,BOX6,0.8,8,6,6,CUST-1,
";
        let summary = importer.import_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.imported, 3);
        assert!(summary.is_clean());

        let rules = repo.find_by_item("ITEM-A").unwrap();
        assert_eq!(rules.len(), 3);
        let scoped = rules.iter().find(|r| r.package_type_id == "BOX6").unwrap();
        assert_eq!(scoped.customer_id.as_deref(), Some("CUST-1"));
        assert_eq!(scoped.unit_key, None);
    }

    #[test]
    fn test_invalid_rows_are_rejected_with_row_numbers() {
        let (importer, repo) = setup_importer();
        let csv = "\
item_id,threshold_quantity,package_type_id,fixed_weight
ITEM-A,12,BOX12,1.5
ITEM-B,abc,BOX12,1.5
,12,BOX12,1.5
ITEM-C,0,BOX12,1.5
ITEM-D,10,BOX10,-1
";
        let summary = importer.import_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(summary.total_rows, 5);
        assert_eq!(summary.imported, 1);
        let rows: Vec<usize> = summary.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![3, 4, 5, 6]);
        assert!(summary.rejected[0].message.contains("threshold_quantity"));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_reimport_updates_existing_rule() {
        let (importer, repo) = setup_importer();
        importer
            .import_from_reader("item_id,threshold_quantity,package_type_id,fixed_weight\nITEM-A,12,BOX12,1.5\n".as_bytes())
            .unwrap();
        importer
            .import_from_reader("item_id,threshold_quantity,package_type_id,fixed_weight\nITEM-A,12,BOX12,2.5\n".as_bytes())
            .unwrap();

        let rules = repo.find_by_item("ITEM-A").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].fixed_weight, 2.5);
    }

    #[test]
    fn test_missing_required_column() {
        let (importer, _) = setup_importer();
        let err = importer
            .import_from_reader("item_id,package_type_id,fixed_weight\nITEM-A,BOX12,1.5\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(ref c) if c == "threshold_quantity"));
    }

    #[test]
    fn test_import_from_csv_file_skips_blank_rows() {
        let (importer, repo) = setup_importer();
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "item_id,threshold_quantity,package_type_id,fixed_weight").unwrap();
        writeln!(temp_file, "ITEM-A,12,BOX12,1.5").unwrap();
        writeln!(temp_file, ",,,").unwrap();
        writeln!(temp_file, "ITEM-B,6,BOX6,1.0").unwrap();

        let summary = importer.import_from_csv(temp_file.path()).unwrap();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_file_not_found() {
        let (importer, _) = setup_importer();
        let err = importer.import_from_csv("non_existent.csv").unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
