//! # atomvault-export
//!
//! The export pipeline's local half:
//! - [`FolderResolver`] rebuilds directory paths from the platform's flat
//!   parent-id folder records, with memoization and cycle/dangling guards
//! - [`ExportOrchestrator`] fetches each component's XML under a bounded
//!   worker pool and writes it to a deterministic, collision-safe path,
//!   isolating per-item failures from the rest of the run

mod folders;
mod orchestrator;

pub use folders::{FolderResolver, UNASSIGNED_DIR};
pub use orchestrator::{ExportOrchestrator, ExportOutcome, RunSummary};
