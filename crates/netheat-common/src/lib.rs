//! Shared types for the netheat load generator.
//!
//! This crate contains:
//! - **Data models** — network, subnet, port, and agent records as the
//!   control plane returns them
//! - **Naming scheme** — deterministic host-scoped resource names and the
//!   reverse-matching predicate used to re-discover them without any
//!   persisted state
//! - **Errors** — the control-plane client error type

pub mod error;
pub mod models;
pub mod naming;
