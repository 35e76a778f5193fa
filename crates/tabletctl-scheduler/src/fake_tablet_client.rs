//! In-memory [`TabletClient`] double. Scriptable per-endpoint failures
//! let scheduler tests exercise the kFailed propagation path without a
//! real tablet fleet.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tabletctl_types::{Endpoint, Pid};

use crate::tablet_client::{TableStatus, TabletClient};

#[derive(Default)]
struct State {
    failing_endpoints: HashSet<String>,
    table_status: HashMap<(String, String, u32), TableStatus>,
    call_log: Vec<String>,
}

/// An in-memory tablet fleet double: every call succeeds and logs
/// itself unless the target endpoint has been marked failing via
/// [`FakeTabletClient::fail_endpoint`].
pub struct FakeTabletClient {
    state: Mutex<State>,
}

impl FakeTabletClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn fail_endpoint(&self, endpoint: &Endpoint) {
        self.state
            .lock()
            .expect("fake tablet client lock poisoned")
            .failing_endpoints
            .insert(endpoint.as_str().to_string());
    }

    pub fn recover_endpoint(&self, endpoint: &Endpoint) {
        self.state
            .lock()
            .expect("fake tablet client lock poisoned")
            .failing_endpoints
            .remove(endpoint.as_str());
    }

    pub fn set_table_status(&self, endpoint: &Endpoint, table: &str, pid: Pid, status: TableStatus) {
        self.state
            .lock()
            .expect("fake tablet client lock poisoned")
            .table_status
            .insert((endpoint.as_str().to_string(), table.to_string(), pid.as_u32()), status);
    }

    pub fn call_log(&self) -> Vec<String> {
        self.state.lock().expect("fake tablet client lock poisoned").call_log.clone()
    }

    fn dispatch(&self, endpoint: &Endpoint, label: &str) -> Result<(), String> {
        let mut state = self.state.lock().expect("fake tablet client lock poisoned");
        state.call_log.push(format!("{}:{label}", endpoint.as_str()));
        if state.failing_endpoints.contains(endpoint.as_str()) {
            Err(format!("{} is unreachable", endpoint.as_str()))
        } else {
            Ok(())
        }
    }
}

impl Default for FakeTabletClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TabletClient for FakeTabletClient {
    fn load_table(&self, endpoint: &Endpoint, _table: &str, _pid: Pid) -> Result<(), String> {
        self.dispatch(endpoint, "load_table")
    }

    fn drop_table(&self, endpoint: &Endpoint, _table: &str, _pid: Pid) -> Result<(), String> {
        self.dispatch(endpoint, "drop_table")
    }

    fn make_snapshot(&self, endpoint: &Endpoint, _table: &str, _pid: Pid) -> Result<(), String> {
        self.dispatch(endpoint, "make_snapshot")
    }

    fn pause_snapshot(&self, endpoint: &Endpoint, _table: &str, _pid: Pid) -> Result<(), String> {
        self.dispatch(endpoint, "pause_snapshot")
    }

    fn recover_snapshot(&self, endpoint: &Endpoint, _table: &str, _pid: Pid) -> Result<(), String> {
        self.dispatch(endpoint, "recover_snapshot")
    }

    fn send_snapshot(
        &self,
        from: &Endpoint,
        _to: &Endpoint,
        _table: &str,
        _pid: Pid,
    ) -> Result<(), String> {
        self.dispatch(from, "send_snapshot")
    }

    fn add_replica(
        &self,
        leader: &Endpoint,
        _follower: &Endpoint,
        _table: &str,
        _pid: Pid,
    ) -> Result<(), String> {
        self.dispatch(leader, "add_replica")
    }

    fn del_replica(&self, endpoint: &Endpoint, _table: &str, _pid: Pid) -> Result<(), String> {
        self.dispatch(endpoint, "del_replica")
    }

    fn change_role(&self, endpoint: &Endpoint, _table: &str, _pid: Pid, _leader: bool) -> Result<(), String> {
        self.dispatch(endpoint, "change_role")
    }

    fn get_table_status(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<TableStatus, String> {
        self.dispatch(endpoint, "get_table_status")?;
        let state = self.state.lock().expect("fake tablet client lock poisoned");
        Ok(state
            .table_status
            .get(&(endpoint.as_str().to_string(), table.to_string(), pid.as_u32()))
            .copied()
            .unwrap_or(TableStatus { term: 0, offset: 0 }))
    }

    fn update_ttl(&self, endpoint: &Endpoint, _table: &str, _pid: Pid) -> Result<(), String> {
        self.dispatch(endpoint, "update_ttl")
    }

    fn dump_index_data(
        &self,
        endpoint: &Endpoint,
        _table: &str,
        _pid: Pid,
        _index_name: &str,
    ) -> Result<(), String> {
        self.dispatch(endpoint, "dump_index_data")
    }

    fn send_index_data(
        &self,
        from: &Endpoint,
        _to: &Endpoint,
        _table: &str,
        _pid: Pid,
    ) -> Result<(), String> {
        self.dispatch(from, "send_index_data")
    }

    fn load_index_data(
        &self,
        endpoint: &Endpoint,
        _table: &str,
        _pid: Pid,
        _index_name: &str,
    ) -> Result<(), String> {
        self.dispatch(endpoint, "load_index_data")
    }

    fn extract_index_data(
        &self,
        endpoint: &Endpoint,
        _table: &str,
        _pid: Pid,
        _index_name: &str,
    ) -> Result<(), String> {
        self.dispatch(endpoint, "extract_index_data")
    }

    fn add_index(
        &self,
        endpoint: &Endpoint,
        _table: &str,
        _pid: Pid,
        _index_name: &str,
    ) -> Result<(), String> {
        self.dispatch(endpoint, "add_index")
    }

    fn check_binlog_sync_progress(
        &self,
        endpoint: &Endpoint,
        _table: &str,
        _pid: Pid,
        _follower: &Endpoint,
        _max_lag_offset: u64,
    ) -> Result<(), String> {
        self.dispatch(endpoint, "check_binlog_sync_progress")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_endpoint_fails_every_call_until_recovered() {
        let client = FakeTabletClient::new();
        let endpoint = Endpoint::new("a:9527");
        client.fail_endpoint(&endpoint);

        assert!(client.load_table(&endpoint, "t", Pid::new(0)).is_err());
        client.recover_endpoint(&endpoint);
        assert!(client.load_table(&endpoint, "t", Pid::new(0)).is_ok());
        assert_eq!(client.call_log().len(), 2);
    }
}
