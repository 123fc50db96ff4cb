//! Transfer engine for atfm.
//!
//! This crate copies or moves the files behind scene references into a
//! project folder. Each reference is planned first ([`plan_transfer`]):
//! tiled sequences expand to every tile, and the destination folder may
//! mirror the subfolders found below the source folder. The
//! [`TransferExecutor`] then transfers each member, resolving name conflicts
//! through a [`ConflictPrompt`] and reporting new paths to a
//! [`ReferenceUpdater`]. One failing file never aborts the batch; failures
//! are collected in the [`TransferReport`].

mod conflict;
mod operation;
mod plan;
mod report;
mod transfer;

pub use conflict::{
    Conflict, ConflictKind, ConflictPrompt, ConflictResolution, Decision, FileStats, PolicyPrompt,
};
pub use operation::{OperationError, TransferMode};
pub use plan::{destination_directory, plan_transfer, TransferOptions, TransferPlan};
pub use report::TransferReport;
pub use transfer::{NoopUpdater, ReferenceUpdater, TransferExecutor};
