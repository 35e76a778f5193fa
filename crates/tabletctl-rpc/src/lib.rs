//! Public RPC Surface (C8): the admin operation bank's request/response
//! types, a typed status distinct from transport errors, and the
//! [`NameServerApi`] trait binding them together (spec.md §4.8, §6).

pub mod api;
pub mod requests;
pub mod status;

pub use api::NameServerApi;
pub use requests::*;
pub use status::{Status, StatusCode};
