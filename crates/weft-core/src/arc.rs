// Arc and label primitives.

/// Label id on an arc. Id 0 is reserved for epsilon.
pub type Label = u32;

/// The reserved label meaning "no symbol consumed/emitted".
pub const EPSILON: Label = 0;

/// Dense state id: a state's position in its owning transducer.
pub type StateId = u32;

/// Sentinel for "no state", used for an unset start state.
pub const NO_STATE: StateId = u32::MAX;

/// A single transition: `(input label, output label, weight, next state)`.
///
/// `next_state` is an index into the owning transducer's state collection,
/// never an owning pointer -- transducers are commonly cyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub next_state: StateId,
}

impl<W> Arc<W> {
    pub fn new(ilabel: Label, olabel: Label, weight: W, next_state: StateId) -> Self {
        Self {
            ilabel,
            olabel,
            weight,
            next_state,
        }
    }

    /// True if this arc consumes and emits nothing.
    pub fn is_epsilon(&self) -> bool {
        self.ilabel == EPSILON && self.olabel == EPSILON
    }
}
