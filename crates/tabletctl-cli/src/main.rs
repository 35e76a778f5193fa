//! Admin CLI for the name server control plane.
//!
//! Every subcommand here is a thin client over [`tabletctl_rpc::NameServerApi`]
//! (spec.md §4.8): it brings up a [`NameServer`] against an in-process
//! coordination backend, places one call, prints the result, and exits.
//! The wire transport a remote operator would actually use is out of
//! scope for this repository (see `tabletctl-coord`); this binary
//! demonstrates the operation bank against a single process the way
//! `tabletctl-server`'s binary demonstrates the daemon.

mod commands;
mod parse;
mod session;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tabletctl_rpc::ClusterMode;

#[derive(Parser)]
#[command(name = "tabletctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a config project directory (defaults to the current one).
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a table.
    CreateTable {
        name: String,
        /// Number of partitions.
        #[arg(long, default_value_t = 1)]
        partitions: u32,
        /// Replication factor.
        #[arg(long, default_value_t = 1)]
        replicas: u32,
        /// `memory`, `disk`, or `blob`.
        #[arg(long, default_value = "memory")]
        storage_mode: String,
        /// Repeatable `name:type[:nullable][:ts]`, e.g. `id:int64:ts`.
        #[arg(long = "column", value_name = "SPEC")]
        columns: Vec<String>,
        /// `none` (default), `absolute:<minutes>`, or `latest:<versions>`.
        #[arg(long, default_value = "none")]
        ttl: String,
    },

    /// Drop a table.
    DropTable { name: String },

    /// Show one table's metadata, or every table if omitted.
    ShowTable { name: Option<String> },

    /// Add a replica of a partition onto a tablet.
    AddReplica { table: String, pid: u32, endpoint: String },

    /// Remove a replica of a partition from a tablet.
    DelReplica { table: String, pid: u32, endpoint: String },

    /// Promote a new leader for a partition.
    ChangeLeader {
        table: String,
        pid: u32,
        /// Preferred candidate; omit to let the scheduler pick.
        #[arg(long)]
        candidate: Option<String>,
    },

    /// Migrate a partition replica between two tablets.
    Migrate { table: String, pid: u32, from: String, to: String },

    /// Take a tablet offline, reassigning everything it hosts.
    OfflineEndpoint { endpoint: String },

    /// Bring a previously-offline tablet back into its partitions.
    RecoverEndpoint { endpoint: String },

    /// Recover a single partition replica onto a tablet.
    RecoverTable { table: String, pid: u32, endpoint: String },

    /// Trigger a snapshot of a partition.
    MakeSnapshot { table: String, pid: u32 },

    /// List tablets and their liveness.
    ShowTablet,

    /// Show OP status, optionally filtered to one table.
    ShowOpStatus { table: Option<String> },

    /// Cancel an in-flight or pending OP.
    CancelOp { op_id: u64 },

    /// Set a runtime configuration key.
    ConfSet { key: String, value: String },

    /// Get a runtime configuration key.
    ConfGet { key: String },

    /// Reconnect the coordination-service session.
    ConnectZk,

    /// Deliberately drop the coordination-service session.
    DisconnectZk,

    /// Change a table's partition count (offline tables only).
    SetTablePartition { table: String, partitions: u32 },

    /// Show a table's partition count.
    GetTablePartition { table: String },

    /// Mark a replica alive or dead without a full reconciliation pass.
    UpdateTableAliveStatus { table: String, pid: u32, endpoint: String, alive: bool },

    /// Register a replica cluster.
    AddReplicaCluster { alias: String, zk_endpoints: String, zk_root_path: String },

    /// List registered replica clusters.
    ShowReplicaCluster,

    /// Deregister a replica cluster.
    RemoveReplicaCluster { alias: String },

    /// Switch this cluster between leader and follower mode.
    SwitchMode {
        #[arg(value_enum)]
        mode: CliClusterMode,
    },

    /// Push a table's rows to a registered replica cluster.
    SyncTable { table: String, cluster_alias: String },

    /// Delete a secondary index.
    DeleteIndex { table: String, index_name: String },

    /// Add a secondary index. Columns are comma-separated.
    AddIndex { table: String, name: String, columns: String },

    /// Add a column to an existing table.
    AddTableField {
        table: String,
        /// `name:type[:nullable][:ts]`.
        column: String,
    },

    /// Change a table's TTL policy.
    UpdateTtl {
        table: String,
        /// `none`, `absolute:<minutes>`, or `latest:<versions>`.
        ttl: String,
    },

    /// Load an existing on-disk replica into the catalog (recovery path).
    LoadTable { table: String, pid: u32, endpoint: String },
}

#[derive(Clone, clap::ValueEnum)]
enum CliClusterMode {
    Leader,
    Follower,
}

impl From<CliClusterMode> for ClusterMode {
    fn from(mode: CliClusterMode) -> Self {
        match mode {
            CliClusterMode::Leader => ClusterMode::Leader,
            CliClusterMode::Follower => ClusterMode::Follower,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let server = session::bring_up(cli.config_dir.as_deref())?;

    use Commands::*;
    match cli.command {
        CreateTable { name, partitions, replicas, storage_mode, columns, ttl } => {
            commands::table::create(&server, name, partitions, replicas, &storage_mode, &columns, &ttl)
        }
        DropTable { name } => commands::table::drop_table(&server, &name),
        ShowTable { name } => commands::table::show(&server, name),
        AddReplica { table, pid, endpoint } => commands::replica::add(&server, table, pid, endpoint),
        DelReplica { table, pid, endpoint } => commands::replica::del(&server, table, pid, endpoint),
        ChangeLeader { table, pid, candidate } => commands::replica::change_leader(&server, table, pid, candidate),
        Migrate { table, pid, from, to } => commands::replica::migrate(&server, table, pid, from, to),
        OfflineEndpoint { endpoint } => commands::replica::offline_endpoint(&server, endpoint),
        RecoverEndpoint { endpoint } => commands::replica::recover_endpoint(&server, endpoint),
        RecoverTable { table, pid, endpoint } => commands::replica::recover_table(&server, table, pid, endpoint),
        MakeSnapshot { table, pid } => commands::op::make_snapshot(&server, table, pid),
        ShowTablet => commands::tablet::show(&server),
        ShowOpStatus { table } => commands::op::show_status(&server, table),
        CancelOp { op_id } => commands::op::cancel(&server, op_id),
        ConfSet { key, value } => commands::config::set(&server, key, value),
        ConfGet { key } => commands::config::get(&server, key),
        ConnectZk => commands::zk::connect(&server),
        DisconnectZk => commands::zk::disconnect(&server),
        SetTablePartition { table, partitions } => commands::table::set_partition(&server, table, partitions),
        GetTablePartition { table } => commands::table::get_partition(&server, table),
        UpdateTableAliveStatus { table, pid, endpoint, alive } => {
            commands::replica::update_alive_status(&server, table, pid, endpoint, alive)
        }
        AddReplicaCluster { alias, zk_endpoints, zk_root_path } => {
            commands::cluster::add(&server, alias, zk_endpoints, zk_root_path)
        }
        ShowReplicaCluster => commands::cluster::show(&server),
        RemoveReplicaCluster { alias } => commands::cluster::remove(&server, alias),
        SwitchMode { mode } => commands::cluster::switch_mode(&server, mode.into()),
        SyncTable { table, cluster_alias } => commands::table::sync(&server, table, cluster_alias),
        DeleteIndex { table, index_name } => commands::table::delete_index(&server, table, index_name),
        AddIndex { table, name, columns } => commands::table::add_index(&server, table, name, columns),
        AddTableField { table, column } => commands::table::add_field(&server, table, column),
        UpdateTtl { table, ttl } => commands::table::update_ttl(&server, table, ttl),
        LoadTable { table, pid, endpoint } => commands::table::load(&server, table, pid, endpoint),
    }
}
