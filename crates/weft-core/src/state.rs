// A transducer state: final weight plus ordered outgoing arcs.

use hashbrown::HashSet;

use crate::arc::{Arc, StateId};

/// One state of a mutable transducer.
///
/// Arc order is meaningful (sorted-arc algorithms rely on it); otherwise it
/// is insertion order. `incoming` is a best-effort set of source states with
/// at least one arc into this state -- an optimization for deletion, not
/// required for correctness.
#[derive(Debug, Clone)]
pub struct State<W> {
    pub(crate) final_weight: W,
    pub(crate) arcs: Vec<Arc<W>>,
    pub(crate) incoming: HashSet<StateId>,
}

impl<W> State<W> {
    pub(crate) fn new(final_weight: W) -> Self {
        Self {
            final_weight,
            arcs: Vec::new(),
            incoming: HashSet::new(),
        }
    }

    pub fn final_weight(&self) -> &W {
        &self.final_weight
    }

    pub fn arcs(&self) -> &[Arc<W>] {
        &self.arcs
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Source states known to have an arc into this state.
    pub fn incoming(&self) -> impl Iterator<Item = StateId> + '_ {
        self.incoming.iter().copied()
    }
}
