//! netheat library.
//!
//! Re-exports the configuration, client interfaces, orchestrator, and
//! provisioning logic so integration tests can drive the create/clean/
//! discover flows against fake clients (no control plane required).

pub mod config;
pub mod control;
pub mod device;
pub mod discovery;
pub mod orchestrator;
pub mod provision;
pub mod run;
