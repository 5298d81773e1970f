//! OpeniBuy Extract - schema-free entity extraction
//!
//! The marketplace service returns arbitrarily-shaped, partially
//! undocumented JSON. This crate locates domain entities inside those
//! payloads without a fixed schema:
//!
//! - [`scan`] walks a payload to bounded depth and collects every array
//! - [`rank`] classifies array elements by structural signature and picks
//!   the winning entity per kind
//! - [`paths`] resolves the handful of fields the service *does* name
//!   consistently (order numbers, shipping quote ids, transaction
//!   requests) via fixed nesting paths
//!
//! Everything here is pure: no I/O, no side effects.

pub mod paths;
pub mod rank;
pub mod scan;

pub use paths::*;
pub use rank::*;
pub use scan::*;
