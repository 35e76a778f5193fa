//! Table DDL and schema-evolution subcommands.

use std::sync::Arc;

use anyhow::{bail, Result};

use tabletctl_coord::memory::MemoryBackend;
use tabletctl_rpc::*;
use tabletctl_server::NameServer;
use tabletctl_types::{IndexDescriptor, Pid, TableInfo};

use crate::{parse, table as render};

type Server = Arc<NameServer<MemoryBackend>>;

pub fn create(
    server: &Server,
    name: String,
    partition_count: u32,
    replica_factor: u32,
    storage_mode: &str,
    columns: &[String],
    ttl: &str,
) -> Result<()> {
    let columns = columns.iter().map(|spec| parse::column(spec)).collect::<Result<Vec<_>>>()?;
    let table = TableInfo {
        name,
        columns,
        ttl: parse::ttl(ttl)?,
        partition_count,
        replica_factor,
        storage_mode: parse::storage_mode(storage_mode)?,
        indexes: vec![],
        partitions: vec![],
        version: 0,
    };

    let response = server.create_table(CreateTableRequest { table });
    report(&response.status)
}

pub fn drop_table(server: &Server, name: &str) -> Result<()> {
    let response = server.drop_table(DropTableRequest { table: name.to_string() });
    report(&response.status)
}

pub fn show(server: &Server, name: Option<String>) -> Result<()> {
    let response = server.show_table(ShowTableRequest { table: name });
    if !response.status.is_ok() {
        return report(&response.status);
    }
    println!("{}", render::tables(&response.tables));
    Ok(())
}

pub fn set_partition(server: &Server, table: String, partitions: u32) -> Result<()> {
    let response = server.set_table_partition(SetTablePartitionRequest { table, partition_count: partitions });
    report(&response.status)
}

pub fn get_partition(server: &Server, table: String) -> Result<()> {
    let response = server.get_table_partition(GetTablePartitionRequest { table });
    if !response.status.is_ok() {
        return report(&response.status);
    }
    println!("{}", response.partition_count);
    Ok(())
}

pub fn sync(server: &Server, table: String, cluster_alias: String) -> Result<()> {
    let response = server.sync_table(SyncTableRequest { table, cluster_alias });
    report_with_op(&response.status, response.op_id)
}

pub fn delete_index(server: &Server, table: String, index_name: String) -> Result<()> {
    let response = server.delete_index(DeleteIndexRequest { table, index_name });
    report(&response.status)
}

pub fn add_index(server: &Server, table: String, name: String, columns: String) -> Result<()> {
    let index = IndexDescriptor { name, column_names: parse::index_columns(&columns) };
    let response = server.add_index(AddIndexRequest { table, index });
    report_with_op(&response.status, response.op_id)
}

pub fn add_field(server: &Server, table: String, column: String) -> Result<()> {
    let column = parse::column(&column)?;
    let response = server.add_table_field(AddTableFieldRequest { table, column });
    report(&response.status)
}

pub fn update_ttl(server: &Server, table: String, ttl: String) -> Result<()> {
    let ttl = parse::ttl(&ttl)?;
    let response = server.update_ttl(UpdateTtlRequest { table, ttl });
    report(&response.status)
}

pub fn load(server: &Server, table: String, pid: u32, endpoint: String) -> Result<()> {
    let response = server.load_table(LoadTableRequest { table, pid: Pid::new(pid), endpoint: endpoint.into() });
    report(&response.status)
}

pub(crate) fn report(status: &Status) -> Result<()> {
    if status.is_ok() {
        println!("ok");
        Ok(())
    } else {
        bail!("{:?}: {}", status.code, status.message)
    }
}

pub(crate) fn report_with_op(status: &Status, op_id: Option<tabletctl_types::OpId>) -> Result<()> {
    if !status.is_ok() {
        return report(status);
    }
    match op_id {
        Some(op_id) => println!("{op_id}"),
        None => println!("ok"),
    }
    Ok(())
}
