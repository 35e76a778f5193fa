//! `CheckTableMeta`: pure schema validation, independent of catalog
//! state so it can run against a `TableInfo` before any coordination
//! write is attempted.

use std::collections::HashSet;

use tabletctl_types::{IndexDescriptor, TableInfo, TtlConfig};

/// A single schema-validation failure. Multiple violations are collected
/// rather than short-circuiting on the first, so `CreateTable` callers
/// get the full picture in one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    DuplicateColumnName(String),
    MultipleTimestampColumnsUnderAbsoluteTtl,
    ZeroPartitionCount,
    ZeroReplicaFactor,
    UnknownColumnInIndex { index: String, column: String },
    EmptyIndexColumnList(String),
}

/// Validates a table's schema in isolation (no catalog or liveness
/// lookups — replica-factor-vs-live-tablets is checked separately by the
/// caller, which has the live tablet count).
pub fn validate_table_meta(table: &TableInfo) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    let mut seen_names = HashSet::new();
    for column in &table.columns {
        if !seen_names.insert(column.name.as_str()) {
            violations.push(SchemaViolation::DuplicateColumnName(column.name.clone()));
        }
    }

    if matches!(table.ttl, TtlConfig::Absolute { .. }) {
        let timestamp_columns = table.columns.iter().filter(|c| c.is_timestamp).count();
        if timestamp_columns > 1 {
            violations.push(SchemaViolation::MultipleTimestampColumnsUnderAbsoluteTtl);
        }
    }

    if table.partition_count == 0 {
        violations.push(SchemaViolation::ZeroPartitionCount);
    }
    if table.replica_factor == 0 {
        violations.push(SchemaViolation::ZeroReplicaFactor);
    }

    violations.extend(validate_indexes(&table.indexes, &seen_names));

    violations
}

fn validate_indexes(
    indexes: &[IndexDescriptor],
    column_names: &HashSet<&str>,
) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    for index in indexes {
        if index.column_names.is_empty() {
            violations.push(SchemaViolation::EmptyIndexColumnList(index.name.clone()));
            continue;
        }
        for column in &index.column_names {
            if !column_names.contains(column.as_str()) {
                violations.push(SchemaViolation::UnknownColumnInIndex {
                    index: index.name.clone(),
                    column: column.clone(),
                });
            }
        }
    }
    violations
}

/// `FillColumnKey`: resolves and validates a requested set of index
/// descriptors against a table's column set, as the original
/// `CreateTableInfo`/`AddTableField` path does, rather than deferring
/// column-key resolution to the tablet.
pub fn resolve_column_keys(
    table: &TableInfo,
    requested: Vec<IndexDescriptor>,
) -> Vec<SchemaViolation> {
    let column_names: HashSet<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    validate_indexes(&requested, &column_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletctl_types::{ColumnDesc, ColumnType, StorageMode};

    fn column(name: &str, is_timestamp: bool) -> ColumnDesc {
        ColumnDesc {
            name: name.to_string(),
            column_type: ColumnType::Int64,
            nullable: false,
            is_timestamp,
        }
    }

    fn base_table() -> TableInfo {
        TableInfo {
            name: "t".into(),
            columns: vec![column("id", false), column("ts", true)],
            ttl: TtlConfig::None,
            partition_count: 1,
            replica_factor: 1,
            storage_mode: StorageMode::Memory,
            indexes: vec![],
            partitions: vec![],
            version: 0,
        }
    }

    #[test]
    fn valid_table_has_no_violations() {
        assert!(validate_table_meta(&base_table()).is_empty());
    }

    #[test]
    fn duplicate_column_names_are_rejected() {
        let mut table = base_table();
        table.columns.push(column("id", false));
        assert!(validate_table_meta(&table)
            .contains(&SchemaViolation::DuplicateColumnName("id".into())));
    }

    #[test]
    fn two_timestamp_columns_under_absolute_ttl_is_rejected() {
        let mut table = base_table();
        table.ttl = TtlConfig::Absolute { ttl_minutes: 60 };
        table.columns.push(column("ts2", true));
        assert!(validate_table_meta(&table)
            .contains(&SchemaViolation::MultipleTimestampColumnsUnderAbsoluteTtl));
    }

    #[test]
    fn index_over_unknown_column_is_rejected() {
        let mut table = base_table();
        table.indexes.push(IndexDescriptor {
            name: "idx".into(),
            column_names: vec!["nope".into()],
        });
        assert!(validate_table_meta(&table).iter().any(|v| matches!(
            v,
            SchemaViolation::UnknownColumnInIndex { column, .. } if column == "nope"
        )));
    }
}
