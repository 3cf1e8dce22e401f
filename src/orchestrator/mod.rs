//! Application-level orchestration.
//!
//! This module owns the session lifecycle: it runs the reducer, executes the
//! commands it emits off the main loop, and streams view snapshots to the
//! attached front end (TUI or headless text/JSON output).

mod controller;

pub(crate) use controller::{run_controller, ControllerOptions, UiCommand};
