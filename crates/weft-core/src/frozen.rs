// Frozen transducer: fixed-size, array-backed, immutable after construction.
//
// Arcs are stored in CSR form (an offset array plus one flat arc array), so
// a state's arcs are a contiguous slice. The snapshot constructor is
// two-phase: all states are sized first, then arcs are wired, so forward
// references in the source are resolved before the value is exposed.

use crate::arc::{Arc, NO_STATE, StateId};
use crate::fst::FstView;
use crate::semiring::Semiring;
use crate::symbols::{FrozenSymbolTable, SymbolTable};

/// Immutable snapshot of a transducer. Safe for unsynchronized concurrent
/// reads; there is no mutation API.
#[derive(Debug, Clone)]
pub struct FrozenFst<S: Semiring> {
    semiring: S,
    start: StateId,
    /// `offsets[s]..offsets[s + 1]` indexes `arcs` for state `s`.
    offsets: Vec<u32>,
    arcs: Vec<Arc<S::Weight>>,
    finals: Vec<S::Weight>,
    isyms: FrozenSymbolTable,
    osyms: FrozenSymbolTable,
}

impl<S: Semiring> FrozenFst<S> {
    /// Snapshot any view into a frozen transducer.
    pub fn freeze(view: &impl FstView<S>) -> Self {
        let n = view.num_states();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut total = 0u32;
        offsets.push(0);
        for s in 0..n as StateId {
            total += view.arcs(s).len() as u32;
            offsets.push(total);
        }

        let mut arcs = Vec::with_capacity(total as usize);
        let mut finals = Vec::with_capacity(n);
        for s in 0..n as StateId {
            arcs.extend(view.arcs(s).iter().cloned());
            finals.push(view.final_weight(s).clone());
        }

        Self {
            semiring: view.semiring().clone(),
            start: view.start().unwrap_or(NO_STATE),
            offsets,
            arcs,
            finals,
            isyms: FrozenSymbolTable::freeze(view.input_symbols().clone()),
            osyms: FrozenSymbolTable::freeze(view.output_symbols().clone()),
        }
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// The frozen input symbol table (mutation attempts fail).
    pub fn frozen_input_symbols(&self) -> &FrozenSymbolTable {
        &self.isyms
    }

    pub fn frozen_output_symbols(&self) -> &FrozenSymbolTable {
        &self.osyms
    }
}

impl<S: Semiring> FstView<S> for FrozenFst<S> {
    fn semiring(&self) -> &S {
        &self.semiring
    }

    fn start(&self) -> Option<StateId> {
        if self.start == NO_STATE {
            None
        } else {
            Some(self.start)
        }
    }

    fn num_states(&self) -> usize {
        self.finals.len()
    }

    fn final_weight(&self, state: StateId) -> &S::Weight {
        &self.finals[state as usize]
    }

    fn arcs(&self, state: StateId) -> &[Arc<S::Weight>] {
        let lo = self.offsets[state as usize] as usize;
        let hi = self.offsets[state as usize + 1] as usize;
        &self.arcs[lo..hi]
    }

    fn input_symbols(&self) -> &SymbolTable {
        self.isyms.as_table()
    }

    fn output_symbols(&self) -> &SymbolTable {
        self.osyms.as_table()
    }
}
