// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`supervisor`] spawns the script, drives the lifecycle and decides the
//!   exit code.
//! - [`capture`] turns one child pipe into records.

pub mod capture;
pub mod supervisor;

pub use capture::{capture_blocking, capture_stream};
pub use supervisor::{Phase, Supervisor, UNKNOWN_EXIT_CODE, exit_code_of};
