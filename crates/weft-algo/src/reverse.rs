// Reverse: a machine accepting the reversed paths with reversed weights.
//
// The input is temporarily collapsed to a single final state (ExtendFinal)
// so the reversed graph has one source, then every arc is flipped with its
// weight passed through `Semiring::reverse`. The ExtendFinal step is undone
// before returning, so the input is restored even though it is taken
// mutably.

use weft_core::arc::StateId;
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;

use crate::extend_final;

/// Build the reversal of `fst`. Fails on semirings that do not define
/// `reverse`, or when no start state is set.
pub fn reverse<S: Semiring>(fst: &mut MutableFst<S>) -> Result<MutableFst<S>, FstError> {
    let start = fst.require_start()?;
    let superfinal = extend_final::apply(fst)?;
    let result = build_reversed(fst, start, superfinal);
    extend_final::undo(fst)?;
    result
}

fn build_reversed<S: Semiring>(
    fst: &MutableFst<S>,
    old_start: StateId,
    superfinal: StateId,
) -> Result<MutableFst<S>, FstError> {
    let ring = fst.semiring().clone();
    let mut out = MutableFst::new(ring.clone());
    out.set_input_symbols(fst.input_symbols().clone());
    out.set_output_symbols(fst.output_symbols().clone());

    for _ in 0..fst.num_states() {
        out.add_state();
    }
    out.set_start(superfinal)?;
    out.set_final(old_start, ring.one())?;

    for s in 0..fst.num_states() as StateId {
        for arc in fst.arcs(s) {
            out.add_arc(
                arc.next_state,
                arc.ilabel,
                arc.olabel,
                ring.reverse(&arc.weight)?,
                s,
            )?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::fst::fst_approx_eq;
    use weft_core::semiring::TropicalSemiring;

    fn chain() -> MutableFst<TropicalSemiring> {
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        let s2 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, 1, 1, 1.0, s1).unwrap();
        fst.add_arc(s1, 2, 2, 2.0, s2).unwrap();
        fst.set_final(s2, 3.0).unwrap();
        fst
    }

    #[test]
    fn arcs_are_flipped_and_start_becomes_final() {
        let mut fst = chain();
        let rev = reverse(&mut fst).unwrap();

        // One extra state: the superfinal is the reversed start.
        assert_eq!(rev.num_states(), 4);
        assert_eq!(rev.start(), Some(3));
        assert!(rev.is_final(0));
        // Old arc 0->1 now runs 1->0.
        assert!(rev.arcs(1).iter().any(|a| a.next_state == 0 && a.ilabel == 1));
        // The superfinal's epsilon arc reversed: it now leads to old state 2
        // carrying the old final weight.
        assert!(
            rev.arcs(3)
                .iter()
                .any(|a| a.next_state == 2 && a.weight == 3.0)
        );
    }

    #[test]
    fn input_is_restored_after_reverse() {
        let mut fst = chain();
        let original = MutableFst::copy_of(&fst);
        reverse(&mut fst).unwrap();
        assert!(fst_approx_eq(&original, &fst));
    }

    #[test]
    fn requires_a_start_state() {
        let mut fst: MutableFst<TropicalSemiring> = MutableFst::new(TropicalSemiring);
        fst.add_state();
        assert!(matches!(
            reverse(&mut fst).unwrap_err(),
            FstError::NoStartState
        ));
    }
}
