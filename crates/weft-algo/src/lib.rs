//! Graph algorithms over weighted finite-state transducers.
//!
//! Every algorithm here is generic over the [`Semiring`](weft_core::Semiring)
//! the weights are interpreted under and operates on the mutable model from
//! `weft-core`. Algorithms either rewrite a machine in place (`arc_sort`,
//! `connect`, `project`) or build a fresh result machine (`compose`,
//! `rm_epsilon`, `determinize`, `reverse`, `shortest`).
//!
//! # Architecture
//!
//! - [`arc_sort`] -- In-place arc ordering, precondition for fast matching
//! - [`connect`] -- Trim states off every start-to-final path
//! - [`project`] -- Collapse a transducer onto one label side
//! - [`compose`] -- Relational composition, with epsilon-filter variant
//! - [`rm_epsilon`] -- Weighted epsilon closure and removal
//! - [`determinize`] -- Weighted subset construction over Gallic weights
//! - [`extend_final`] -- Reversible single-final-state normal form
//! - [`reverse`] -- Path reversal with weight reversal
//! - [`shortest`] -- Generalized shortest distance, n-shortest paths

pub mod arc_sort;
pub mod compose;
pub mod connect;
pub mod determinize;
pub mod extend_final;
pub mod project;
pub mod reverse;
pub mod rm_epsilon;
pub mod shortest;

pub use arc_sort::{sort_by, sort_by_input, sort_by_output};
pub use compose::{compose, compose_eps};
pub use connect::connect;
pub use determinize::{DeterminizeMode, determinize};
pub use project::{ProjectType, project};
pub use reverse::reverse;
pub use rm_epsilon::rm_epsilon;
pub use shortest::{n_shortest_paths, shortest_distance};
