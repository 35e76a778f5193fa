//! Small parsers turning flat CLI strings into catalog types, so the
//! operation bank itself never has to know about text formats.

use anyhow::{bail, Context, Result};

use tabletctl_types::{ColumnDesc, ColumnType, StorageMode, TtlConfig};

/// `name:type[:nullable][:ts]`, e.g. `id:int64:ts` or `note:string:nullable`.
pub fn column(spec: &str) -> Result<ColumnDesc> {
    let mut parts = spec.split(':');
    let name = parts.next().context("column spec is missing a name")?.to_string();
    let type_name = parts.next().context("column spec is missing a type")?;
    let column_type = column_type(type_name)?;

    let mut nullable = false;
    let mut is_timestamp = false;
    for flag in parts {
        match flag {
            "nullable" => nullable = true,
            "ts" => is_timestamp = true,
            other => bail!("unknown column flag: {other}"),
        }
    }

    Ok(ColumnDesc { name, column_type, nullable, is_timestamp })
}

fn column_type(name: &str) -> Result<ColumnType> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "bool" => ColumnType::Bool,
        "int32" => ColumnType::Int32,
        "int64" => ColumnType::Int64,
        "float" => ColumnType::Float,
        "double" => ColumnType::Double,
        "string" => ColumnType::String,
        "timestamp" => ColumnType::Timestamp,
        "blob" => ColumnType::Blob,
        other => bail!("unknown column type: {other}"),
    })
}

pub fn storage_mode(name: &str) -> Result<StorageMode> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "memory" => StorageMode::Memory,
        "disk" => StorageMode::Disk,
        "blob" => StorageMode::Blob,
        other => bail!("unknown storage mode: {other}"),
    })
}

/// `none`, `absolute:<minutes>`, or `latest:<versions>`.
pub fn ttl(spec: &str) -> Result<TtlConfig> {
    let mut parts = spec.split(':');
    let kind = parts.next().unwrap_or("none");
    Ok(match kind.to_ascii_lowercase().as_str() {
        "none" => TtlConfig::None,
        "absolute" => {
            let minutes = parts.next().context("absolute TTL needs a minute count")?;
            TtlConfig::Absolute { ttl_minutes: minutes.parse().context("TTL minutes must be a number")? }
        }
        "latest" => {
            let versions = parts.next().context("latest TTL needs a version count")?;
            TtlConfig::Latest { max_versions: versions.parse().context("TTL versions must be a number")? }
        }
        other => bail!("unknown TTL kind: {other}"),
    })
}

/// Comma-separated column list for a secondary index, e.g. `a,b,c`.
pub fn index_columns(spec: &str) -> Vec<String> {
    spec.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_parses_type_and_flags() {
        let desc = column("id:int64:ts").unwrap();
        assert_eq!(desc.name, "id");
        assert_eq!(desc.column_type, ColumnType::Int64);
        assert!(desc.is_timestamp);
        assert!(!desc.nullable);
    }

    #[test]
    fn column_rejects_unknown_flag() {
        assert!(column("id:int64:bogus").is_err());
    }

    #[test]
    fn column_rejects_unknown_type() {
        assert!(column("id:decimal").is_err());
    }

    #[test]
    fn ttl_defaults_to_none() {
        assert_eq!(ttl("none").unwrap(), TtlConfig::None);
    }

    #[test]
    fn ttl_parses_absolute_minutes() {
        assert_eq!(ttl("absolute:60").unwrap(), TtlConfig::Absolute { ttl_minutes: 60 });
    }

    #[test]
    fn ttl_parses_latest_versions() {
        assert_eq!(ttl("latest:3").unwrap(), TtlConfig::Latest { max_versions: 3 });
    }

    #[test]
    fn ttl_rejects_missing_argument() {
        assert!(ttl("absolute").is_err());
    }

    #[test]
    fn storage_mode_is_case_insensitive() {
        assert_eq!(storage_mode("MEMORY").unwrap(), StorageMode::Memory);
    }

    #[test]
    fn index_columns_trims_and_skips_blanks() {
        assert_eq!(index_columns("a, b ,,c"), vec!["a", "b", "c"]);
    }
}
