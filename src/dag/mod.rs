// src/dag/mod.rs

//! Task dependency graph.
//!
//! - [`order`] defines order codes and their (length, lexicographic) ordering.
//! - [`template`] holds the library-level task templates.
//! - [`validate`] checks template graphs for ordering and cycles.
//! - [`graph`] answers readiness questions over a season snapshot.

pub mod graph;
pub mod order;
pub mod template;
pub mod validate;

pub use graph::TaskGraph;
pub use order::OrderCode;
pub use template::TaskTemplate;
pub use validate::{PrecedenceMap, validate_library, validate_template_graph};
