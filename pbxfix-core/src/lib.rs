//! Embeddable core library for pbxfix.
//!
//! Provides a clap-free, I/O-abstracted entry point for the post-export
//! step that adds a notification service extension to an exported iOS
//! project.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`ReadPort`](ports::ReadPort): read project files and templates
//! - [`WritePort`](ports::WritePort): write files and create directories
//!
//! The [`adapters`] module provides filesystem-backed and in-memory
//! implementations.
//!
//! # Entry points
//!
//! - [`run_postprocess`](pipeline::run_postprocess): run all steps, return a report and diff
//! - [`write_report_artifacts`](pipeline::write_report_artifacts): persist them

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod render;
pub mod settings;

pub use pipeline::{PostProcessOutcome, ToolError, run_postprocess, write_report_artifacts};
pub use settings::PostProcessSettings;
