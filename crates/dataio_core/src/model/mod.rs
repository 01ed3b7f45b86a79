//! Identity-keyed record model shared by every storage backend.
//!
//! # Responsibility
//! - Define the contract every persisted record satisfies.
//! - Provide identity-only equality for collections of records.
//! - Route change/save notifications without embedding listeners in records.
//!
//! # Invariants
//! - Two records with equal identifiers are the same logical record.
//! - Records are never deleted by core; only upserted.

pub mod entity;
pub mod events;
