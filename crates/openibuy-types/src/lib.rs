//! OpeniBuy Types - Canonical domain types for the buyer-side purchase flow
//!
//! This crate contains all foundational types for OpeniBuy with zero
//! dependencies on other openibuy crates:
//!
//! - Entities recognized inside tool payloads (products, addresses, wallets)
//! - Validated on-chain value formats (transaction hashes, wallet addresses)
//! - Coercion helpers for untrusted, schema-free payload values
//! - The end-of-saga summary record
//!
//! # Architectural Invariants
//!
//! 1. Entities are inferred structurally, never declared by the service
//! 2. A numeric id from an untrusted payload is a finite, positive integer
//!    or it is absent - malformed values never collapse to zero
//! 3. Evidence formats are validated before anything is sent on the wire

pub mod coerce;
pub mod entity;
pub mod error;
pub mod evidence;
pub mod summary;

pub use coerce::*;
pub use entity::*;
pub use error::*;
pub use evidence::*;
pub use summary::*;
