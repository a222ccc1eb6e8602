//! sysrelay daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `sysrelay-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod control;
pub mod health;
pub mod logging;
pub mod metrics_server;
pub mod monitor;
pub mod orchestrator;
