// ExtendFinal: collapse all final states into one synthetic superfinal
// state, and undo it afterwards.
//
// `apply` gives the machine a single final state by routing every final
// weight over an epsilon arc into a fresh state; `undo` reverses that
// exactly. Reverse and shortest-distance use the pair so the reversed graph
// has a single source.

use weft_core::arc::{EPSILON, StateId};
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;

/// Add a superfinal state with final weight `one`; every previously final
/// state gets an `<eps>:<eps>` arc into it carrying its final weight and
/// becomes non-final. Returns the new state's id.
pub fn apply<S: Semiring>(fst: &mut MutableFst<S>) -> Result<StateId, FstError> {
    let ring = fst.semiring().clone();
    let finals: Vec<(StateId, S::Weight)> = (0..fst.num_states() as StateId)
        .filter(|&s| fst.is_final(s))
        .map(|s| (s, fst.final_weight(s).clone()))
        .collect();

    let superfinal = fst.add_state();
    fst.set_final(superfinal, ring.one())?;
    for (s, w) in finals {
        fst.add_arc(s, EPSILON, EPSILON, w, superfinal)?;
        fst.set_final(s, ring.zero())?;
    }
    Ok(superfinal)
}

/// Undo [`apply`]: the unique final state is removed, and each state with an
/// epsilon arc into it becomes final again with that arc's weight (summed
/// if there are several).
pub fn undo<S: Semiring>(fst: &mut MutableFst<S>) -> Result<(), FstError> {
    let ring = fst.semiring().clone();
    let finals: Vec<StateId> = (0..fst.num_states() as StateId)
        .filter(|&s| fst.is_final(s))
        .collect();
    let [superfinal] = finals.as_slice() else {
        return Err(FstError::CorruptModel(format!(
            "extend_final undo expects exactly one final state, found {}",
            finals.len()
        )));
    };
    let superfinal = *superfinal;

    for s in 0..fst.num_states() as StateId {
        if s == superfinal {
            continue;
        }
        let restored: Vec<S::Weight> = fst
            .arcs(s)
            .iter()
            .filter(|a| a.next_state == superfinal && a.is_epsilon())
            .map(|a| a.weight.clone())
            .collect();
        if restored.is_empty() {
            continue;
        }
        let mut weight = fst.final_weight(s).clone();
        for w in restored {
            weight = ring.plus(&weight, &w)?;
        }
        fst.set_final(s, weight)?;
        fst.arcs_mut(s)
            .retain(|a| !(a.next_state == superfinal && a.is_epsilon()));
    }

    // Deleting the superfinal drops any remaining arcs into it.
    fst.delete_state(superfinal)?;
    Ok(())
}
