//! Shared DTOs (schemas-as-code) for the pbxfix workspace.
//!
//! # Design constraints
//! - These types are serialized to disk next to the exported project.
//! - Prefer adding optional fields over changing semantics.

pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const PBXFIX_REPORT_V1: &str = "pbxfix.report.v1";
}
