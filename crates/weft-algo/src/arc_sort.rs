// In-place arc sorting.
//
// Each state's outgoing arcs are stably sorted by a caller-supplied
// comparator. Sorting by input label is the precondition for the early-break
// variant of composition.

use std::cmp::Ordering;

use weft_core::arc::StateId;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;
use weft_core::Arc;

/// Order by input label, then output label, then weight, then target id.
pub fn ilabel_compare<W: PartialOrd>(a: &Arc<W>, b: &Arc<W>) -> Ordering {
    a.ilabel
        .cmp(&b.ilabel)
        .then(a.olabel.cmp(&b.olabel))
        .then(a.weight.partial_cmp(&b.weight).unwrap_or(Ordering::Equal))
        .then(a.next_state.cmp(&b.next_state))
}

/// Order by output label first.
pub fn olabel_compare<W: PartialOrd>(a: &Arc<W>, b: &Arc<W>) -> Ordering {
    a.olabel
        .cmp(&b.olabel)
        .then(a.ilabel.cmp(&b.ilabel))
        .then(a.weight.partial_cmp(&b.weight).unwrap_or(Ordering::Equal))
        .then(a.next_state.cmp(&b.next_state))
}

/// Stably sort every state's arcs with the given comparator.
pub fn sort_by<S, F>(fst: &mut MutableFst<S>, mut cmp: F)
where
    S: Semiring,
    F: FnMut(&Arc<S::Weight>, &Arc<S::Weight>) -> Ordering,
{
    for s in 0..fst.num_states() as StateId {
        fst.arcs_mut(s).sort_by(&mut cmp);
    }
}

/// Sort every state's arcs by input label.
pub fn sort_by_input<S>(fst: &mut MutableFst<S>)
where
    S: Semiring,
    S::Weight: PartialOrd,
{
    sort_by(fst, ilabel_compare);
}

/// Sort every state's arcs by output label.
pub fn sort_by_output<S>(fst: &mut MutableFst<S>)
where
    S: Semiring,
    S::Weight: PartialOrd,
{
    sort_by(fst, olabel_compare);
}

/// True if the state's arcs are already in comparator order.
pub fn is_sorted<S, V, F>(fst: &V, state: StateId, mut cmp: F) -> bool
where
    S: Semiring,
    V: FstView<S>,
    F: FnMut(&Arc<S::Weight>, &Arc<S::Weight>) -> Ordering,
{
    fst.arcs(state)
        .windows(2)
        .all(|w| cmp(&w[0], &w[1]) != Ordering::Greater)
}
