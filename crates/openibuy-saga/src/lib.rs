//! OpeniBuy Saga - the purchase orchestrator
//!
//! Runs the purchase workflow as a strictly sequential saga over a
//! [`openibuy_client::ToolInvoker`]:
//!
//! ```text
//! bootstrap user -> resolve address -> resolve wallet
//!   -> select product -> estimate shipping -> create order
//!   -> create escrow -> fund escrow -> confirm receipt -> fetch proof
//! ```
//!
//! Each stage is gated on the tools the service advertises: an
//! unadvertised tool skips its stage, it never fails it. The on-chain
//! steps surface transaction requests and bridge to the settlement layer
//! through externally supplied hashes; a missing hash is a soft gap
//! recorded in the summary, not an error.
//!
//! One run is stateless and best-effort: the first fatal condition aborts
//! the whole saga, nothing is retried or rolled back.

pub mod config;
pub mod error;
pub mod runner;
pub mod stage;

pub use config::*;
pub use error::*;
pub use runner::*;
pub use stage::*;
