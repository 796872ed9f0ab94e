//! Command-line interface definitions and helpers.
//!
//! This module contains the argument parsers and handlers for both binaries.

mod args;
mod commands;

pub use args::{CaptureArgs, MonitorArgs};
pub use commands::{
    capture_settings, list_ports, monitor_serial_settings, resolve_port, run_capture, run_monitor,
};
