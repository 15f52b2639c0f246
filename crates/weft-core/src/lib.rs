//! Weighted finite-state transducer data model and semiring algebra.
//!
//! This crate holds the model shared by the whole workspace: labeled,
//! weighted directed graphs whose path weights are interpreted under a
//! semiring, plus the algebra itself.
//!
//! # Architecture
//!
//! - [`symbols`] -- Bidirectional string/label-id tables, frozen views
//! - [`arc`] -- Labels, state ids, the `Arc` transition tuple
//! - [`state`] -- A state: final weight + ordered outgoing arcs
//! - [`fst`] -- The growable `MutableFst` and the read-only `FstView` trait
//! - [`frozen`] -- The CSR-backed immutable `FrozenFst` snapshot
//! - [`semiring`] -- The `Semiring` contract; Tropical, Log, Probability
//! - [`gallic`] -- Label-sequence x inner-weight product semiring
//! - [`union_weight`] -- Sorted-set-of-weights "union as plus" semiring
//!
//! Semirings are plain values passed explicitly; there is no global state.
//! The core never logs and never retries: every fallible operation surfaces
//! an [`FstError`] immediately and discards partial results.

pub mod arc;
pub mod error;
pub mod frozen;
pub mod fst;
pub mod gallic;
pub mod semiring;
pub mod state;
pub mod symbols;
pub mod union_weight;

pub use arc::{Arc, EPSILON, Label, NO_STATE, StateId};
pub use error::{ErrorKind, FstError};
pub use frozen::FrozenFst;
pub use fst::{FstView, MutableFst, fst_approx_eq};
pub use gallic::{GallicMode, GallicSemiring, GallicWeight};
pub use semiring::{
    DEFAULT_APPROX_DELTA, LogSemiring, ProbabilitySemiring, Semiring, SemiringKind, StdSemiring,
    TropicalSemiring,
};
pub use state::State;
pub use symbols::{EPSILON_SYMBOL, FrozenSymbolTable, SymbolTable};
pub use union_weight::{UnionElementOps, UnionSemiring, UnionWeight};
