// src/snapshot/mod.rs

//! Per-season snapshots and the pure computations over them.
//!
//! - [`model`] defines task entries and the snapshot record.
//! - [`materialize`] builds a snapshot from the template library.
//! - [`propagate`] recomputes planned dates by bounded fixpoint iteration.
//! - [`attention`] derives the departments with actionable work.
//!
//! Everything here is synchronous and free of IO.

pub mod attention;
pub mod materialize;
pub mod model;
pub mod propagate;

pub use attention::{actionable_entries, compute_attention};
pub use materialize::{MaterializedSnapshot, materialize_snapshot};
pub use model::{Attachment, ComputedDates, Snapshot, TaskEntry};
pub use propagate::{PropagationReport, propagate_dates};
