//! Typed admin-RPC status (spec.md §6): every response carries one of
//! these instead of a bare error string, mirroring how the teacher's
//! `ServerError::not_leader`/`is_not_leader` give callers a matchable
//! status rather than a formatted message.

use serde::{Deserialize, Serialize};

use tabletctl_catalog::CatalogError;
use tabletctl_coord::CoordError;
use tabletctl_registry::RegistryError;
use tabletctl_scheduler::SchedulerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    BadRequest,
    NameExists,
    TableNotFound,
    ReplicaExists,
    ReplicaNotFound,
    NotLeader,
    ZkError,
    RpcError,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn ok() -> Self {
        Self { code: StatusCode::Ok, message: String::new() }
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    pub fn not_leader() -> Self {
        Self { code: StatusCode::NotLeader, message: "this name server does not hold the coordination lock".into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { code: StatusCode::BadRequest, message: message.into() }
    }

    pub fn name_exists(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { message: format!("{name} already exists"), code: StatusCode::NameExists }
    }

    pub fn table_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { message: format!("table {name} not found"), code: StatusCode::TableNotFound }
    }

    pub fn replica_exists(message: impl Into<String>) -> Self {
        Self { code: StatusCode::ReplicaExists, message: message.into() }
    }

    pub fn replica_not_found(message: impl Into<String>) -> Self {
        Self { code: StatusCode::ReplicaNotFound, message: message.into() }
    }

    pub fn zk_error(message: impl Into<String>) -> Self {
        Self { code: StatusCode::ZkError, message: message.into() }
    }

    pub fn rpc_error(message: impl Into<String>) -> Self {
        Self { code: StatusCode::RpcError, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { code: StatusCode::Internal, message: message.into() }
    }
}

impl From<CoordError> for Status {
    fn from(error: CoordError) -> Self {
        match error {
            CoordError::NodeExists(name) => Status::name_exists(name),
            CoordError::NodeMissing(name) => Status::bad_request(format!("node not found: {name}")),
            CoordError::SessionExpired | CoordError::NotConnected => Status::zk_error(error.to_string()),
            CoordError::VersionConflict { .. } | CoordError::Io(_) => Status::zk_error(error.to_string()),
        }
    }
}

impl From<CatalogError> for Status {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::TableNotFound(name) => Status::table_not_found(name),
            CatalogError::TableExists(name) => Status::name_exists(name),
            CatalogError::SchemaInvalid(_) => Status::bad_request(error.to_string()),
            CatalogError::ReplicaFactorExceedsLiveTablets { .. } => Status::bad_request(error.to_string()),
            CatalogError::Conflict { .. } => Status::internal(error.to_string()),
            CatalogError::Coord(inner) => Status::from(inner),
        }
    }
}

impl From<RegistryError> for Status {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::AliasExists(alias) => Status::name_exists(alias),
            RegistryError::AliasMissing(alias) => Status::bad_request(format!("replica cluster not registered: {alias}")),
            RegistryError::StaleTerm { .. } => Status::bad_request(error.to_string()),
            RegistryError::PeerRpc(message) => Status::rpc_error(message),
            RegistryError::Coord(inner) => Status::from(inner),
        }
    }
}

impl From<SchedulerError> for Status {
    fn from(error: SchedulerError) -> Self {
        match error {
            SchedulerError::UnknownOp(id) => Status::bad_request(format!("unknown op id: {id}")),
            SchedulerError::Catalog(inner) => Status::from(inner),
            SchedulerError::Coord(inner) => Status::from(inner),
            SchedulerError::TabletRpc { endpoint, message } => {
                Status::rpc_error(format!("{endpoint}: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_status_has_empty_message() {
        let status = Status::ok();
        assert!(status.is_ok());
        assert!(status.message.is_empty());
    }

    #[test]
    fn not_leader_is_not_ok() {
        assert!(!Status::not_leader().is_ok());
    }

    #[test]
    fn catalog_table_not_found_maps_to_table_not_found_code() {
        let status = Status::from(CatalogError::TableNotFound("t1".into()));
        assert_eq!(status.code, StatusCode::TableNotFound);
    }

    #[test]
    fn scheduler_tablet_rpc_maps_to_rpc_error_code() {
        let status = Status::from(SchedulerError::TabletRpc { endpoint: "a:1".into(), message: "timeout".into() });
        assert_eq!(status.code, StatusCode::RpcError);
    }
}
