//! Storage-agnostic services.
//!
//! # Responsibility
//! - Offer record-level use cases on top of any reader/writer pair.
//! - Keep callers decoupled from the backing medium.

pub mod data_service;
