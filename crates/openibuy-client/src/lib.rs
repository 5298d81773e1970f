//! OpeniBuy Client - transport and capability layer
//!
//! Everything the orchestrator consumes but does not own lives here:
//!
//! - [`invoker::ToolInvoker`] - the tool-calling capability, implemented
//!   by [`rpc::McpToolClient`] over JSON-RPC 2.0 / HTTP
//! - [`auth::AuthStrategy`] - pluggable bearer-credential acquisition
//!   (provided token, bootstrap exchange, client credentials)
//! - [`detail::ShopDetailResolver`] - REST fallback lookup for shop ids
//!   the search result omitted
//! - [`evidence::TransactionEvidenceSource`] - where externally signed
//!   transaction hashes come from
//!
//! The orchestrator never calls a tool the service did not advertise and
//! never sees a bearer token; both concerns stop at this crate.

pub mod auth;
pub mod detail;
pub mod endpoint;
pub mod error;
pub mod evidence;
pub mod invoker;
pub mod jwt;
pub mod normalize;
pub mod rpc;

pub use auth::*;
pub use detail::*;
pub use endpoint::*;
pub use error::*;
pub use evidence::*;
pub use invoker::*;
pub use jwt::*;
pub use normalize::*;
pub use rpc::*;
