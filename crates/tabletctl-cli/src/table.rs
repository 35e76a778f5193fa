//! `comfy-table` renderers for the listing subcommands.

use comfy_table::{presets::UTF8_FULL, Table};

use tabletctl_rpc::{OpStatusSummary, ReplicaClusterSummary, TabletSummary};
use tabletctl_types::TableInfo;

pub fn tables(tables: &[TableInfo]) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_header(vec!["name", "partitions", "replicas", "storage", "version"]);
    for table in tables {
        out.add_row(vec![
            table.name.clone(),
            table.partition_count.to_string(),
            table.replica_factor.to_string(),
            format!("{:?}", table.storage_mode),
            table.version.to_string(),
        ]);
    }
    out
}

pub fn tablets(tablets: &[TabletSummary]) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_header(vec!["endpoint", "state"]);
    for tablet in tablets {
        out.add_row(vec![tablet.endpoint.to_string(), format!("{:?}", tablet.state)]);
    }
    out
}

pub fn ops(ops: &[OpStatusSummary]) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_header(vec!["op_id", "table", "pid", "state", "last_failed_task"]);
    for op in ops {
        out.add_row(vec![
            op.op_id.to_string(),
            op.table.clone(),
            op.pid.to_string(),
            format!("{:?}", op.state),
            op.last_failed_task.clone().unwrap_or_default(),
        ]);
    }
    out
}

pub fn clusters(clusters: &[ReplicaClusterSummary]) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_header(vec!["alias", "healthy", "term"]);
    for cluster in clusters {
        out.add_row(vec![cluster.alias.clone(), cluster.healthy.to_string(), cluster.term.to_string()]);
    }
    out
}
