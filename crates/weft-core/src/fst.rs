// Mutable transducer and the read-only view trait.
//
// States live in an arena (`Vec<State>`) and reference each other by dense
// integer id, which is what allows arbitrary cycles. Deleting states
// renumbers the survivors so ids stay dense -- every algorithm assumes
// density.

use hashbrown::HashSet;

use crate::arc::{Arc, Label, NO_STATE, StateId};
use crate::error::FstError;
use crate::semiring::Semiring;
use crate::state::State;
use crate::symbols::SymbolTable;

/// Read-only capability over a transducer, implemented by both the mutable
/// and the frozen variant.
pub trait FstView<S: Semiring> {
    fn semiring(&self) -> &S;
    fn start(&self) -> Option<StateId>;
    fn num_states(&self) -> usize;
    /// Final weight of `state`. Panics if the id is out of range; ids are
    /// only ever obtained from the transducer itself.
    fn final_weight(&self, state: StateId) -> &S::Weight;
    /// Outgoing arcs of `state`, in stored order.
    fn arcs(&self, state: StateId) -> &[Arc<S::Weight>];
    fn input_symbols(&self) -> &SymbolTable;
    fn output_symbols(&self) -> &SymbolTable;
}

/// Growable transducer: an owning arena of states plus start id, symbol
/// tables, and the semiring the weights are interpreted under.
#[derive(Debug, Clone)]
pub struct MutableFst<S: Semiring> {
    semiring: S,
    states: Vec<State<S::Weight>>,
    start: StateId,
    isyms: SymbolTable,
    osyms: SymbolTable,
    state_syms: Option<SymbolTable>,
}

impl<S: Semiring> MutableFst<S> {
    /// Create an empty transducer. Both symbol tables start with `<eps>`
    /// registered at index 0.
    pub fn new(semiring: S) -> Self {
        Self {
            semiring,
            states: Vec::new(),
            start: NO_STATE,
            isyms: SymbolTable::with_epsilon(),
            osyms: SymbolTable::with_epsilon(),
            state_syms: None,
        }
    }

    /// Copy the structure, weights and symbol tables of any view into a new
    /// mutable transducer.
    pub fn copy_of(view: &impl FstView<S>) -> Self {
        let mut fst = Self::new(view.semiring().clone());
        fst.isyms = view.input_symbols().clone();
        fst.osyms = view.output_symbols().clone();
        for s in 0..view.num_states() as StateId {
            let id = fst.add_state();
            fst.states[id as usize].final_weight = view.final_weight(s).clone();
        }
        for s in 0..view.num_states() as StateId {
            for arc in view.arcs(s) {
                fst.states[s as usize].arcs.push(arc.clone());
                fst.states[arc.next_state as usize].incoming.insert(s);
            }
        }
        if let Some(start) = view.start() {
            fst.start = start;
        }
        fst
    }

    /// Add a non-final state, returning its id.
    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(State::new(self.semiring.zero()));
        id
    }

    pub fn set_start(&mut self, state: StateId) -> Result<(), FstError> {
        self.check_state(state)?;
        self.start = state;
        Ok(())
    }

    /// The start state, or an error for algorithms that require one.
    pub fn require_start(&self) -> Result<StateId, FstError> {
        if self.start == NO_STATE {
            Err(FstError::NoStartState)
        } else {
            Ok(self.start)
        }
    }

    pub fn set_final(&mut self, state: StateId, weight: S::Weight) -> Result<(), FstError> {
        self.check_state(state)?;
        self.states[state as usize].final_weight = weight;
        Ok(())
    }

    /// True if the state's final weight is not the semiring zero.
    pub fn is_final(&self, state: StateId) -> bool {
        !self
            .semiring
            .is_zero(&self.states[state as usize].final_weight)
    }

    pub fn state(&self, state: StateId) -> Option<&State<S::Weight>> {
        self.states.get(state as usize)
    }

    /// Add an arc between two existing states.
    pub fn add_arc(
        &mut self,
        src: StateId,
        ilabel: Label,
        olabel: Label,
        weight: S::Weight,
        dst: StateId,
    ) -> Result<(), FstError> {
        self.check_state(src)?;
        self.check_state(dst)?;
        self.states[src as usize]
            .arcs
            .push(Arc::new(ilabel, olabel, weight, dst));
        self.states[dst as usize].incoming.insert(src);
        Ok(())
    }

    /// Mutable access to a state's arc list, for in-place permutation or
    /// relabeling. Callers changing `next_state` ids are responsible for
    /// keeping them valid; the incoming-id sets stay best-effort.
    pub fn arcs_mut(&mut self, state: StateId) -> &mut Vec<Arc<S::Weight>> {
        &mut self.states[state as usize].arcs
    }

    /// Delete one state. The start state cannot be deleted. Every arc in
    /// any other state targeting it is dropped, and surviving ids are
    /// densely renumbered.
    pub fn delete_state(&mut self, state: StateId) -> Result<(), FstError> {
        self.check_state(state)?;
        if state == self.start {
            return Err(FstError::DeleteStartState(state));
        }
        let mut dead = HashSet::new();
        dead.insert(state);
        self.delete_states(&dead);
        Ok(())
    }

    /// Delete a set of states and renumber the survivors densely. Arcs
    /// targeting a deleted state are dropped. If the start state is among
    /// the deleted, the transducer is left with no start.
    pub fn delete_states(&mut self, dead: &HashSet<StateId>) {
        if dead.is_empty() {
            return;
        }
        let mut remap = vec![NO_STATE; self.states.len()];
        let mut next: StateId = 0;
        for old in 0..self.states.len() as StateId {
            if !dead.contains(&old) {
                remap[old as usize] = next;
                next += 1;
            }
        }

        let old_states = std::mem::take(&mut self.states);
        self.states.reserve(next as usize);
        for (old_id, mut state) in old_states.into_iter().enumerate() {
            if remap[old_id] == NO_STATE {
                continue;
            }
            state
                .arcs
                .retain(|arc| remap[arc.next_state as usize] != NO_STATE);
            for arc in &mut state.arcs {
                arc.next_state = remap[arc.next_state as usize];
            }
            state.incoming = state
                .incoming
                .iter()
                .filter(|&&src| remap[src as usize] != NO_STATE)
                .map(|&src| remap[src as usize])
                .collect();
            self.states.push(state);
        }

        self.start = if self.start == NO_STATE {
            NO_STATE
        } else {
            remap[self.start as usize]
        };
    }

    pub fn input_symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.isyms
    }

    pub fn output_symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.osyms
    }

    pub fn set_input_symbols(&mut self, table: SymbolTable) {
        self.isyms = table;
    }

    pub fn set_output_symbols(&mut self, table: SymbolTable) {
        self.osyms = table;
    }

    /// Optional per-state label table.
    pub fn state_symbols(&self) -> Option<&SymbolTable> {
        self.state_syms.as_ref()
    }

    pub fn set_state_symbols(&mut self, table: Option<SymbolTable>) {
        self.state_syms = table;
    }

    fn check_state(&self, state: StateId) -> Result<(), FstError> {
        if (state as usize) < self.states.len() {
            Ok(())
        } else {
            Err(FstError::NoSuchState(state))
        }
    }
}

impl<S: Semiring> FstView<S> for MutableFst<S> {
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
        self.states.len()
    }

    fn final_weight(&self, state: StateId) -> &S::Weight {
        &self.states[state as usize].final_weight
    }

    fn arcs(&self, state: StateId) -> &[Arc<S::Weight>] {
        &self.states[state as usize].arcs
    }

    fn input_symbols(&self) -> &SymbolTable {
        &self.isyms
    }

    fn output_symbols(&self) -> &SymbolTable {
        &self.osyms
    }
}

/// Structural and weight comparison of two transducers: same state count,
/// same start, and per state the same final weight (within the semiring
/// tolerance) and the same arc sequence. Arc order matters; sort both sides
/// first when order is not meaningful.
pub fn fst_approx_eq<S, A, B>(a: &A, b: &B) -> bool
where
    S: Semiring,
    A: FstView<S>,
    B: FstView<S>,
{
    let ring = a.semiring();
    if a.num_states() != b.num_states() || a.start() != b.start() {
        return false;
    }
    for s in 0..a.num_states() as StateId {
        if !ring.approx_eq(a.final_weight(s), b.final_weight(s)) {
            return false;
        }
        let arcs_a = a.arcs(s);
        let arcs_b = b.arcs(s);
        if arcs_a.len() != arcs_b.len() {
            return false;
        }
        for (x, y) in arcs_a.iter().zip(arcs_b) {
            if x.ilabel != y.ilabel
                || x.olabel != y.olabel
                || x.next_state != y.next_state
                || !ring.approx_eq(&x.weight, &y.weight)
            {
                return false;
            }
        }
    }
    true
}
