//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Quota Monitor: prunes the chapter cache before the backing store fills up

mod monitor;

pub use monitor::{run_quota_check, spawn_quota_monitor};
