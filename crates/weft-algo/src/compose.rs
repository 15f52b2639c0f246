// Composition: C = A . B matches A's output labels against B's input
// labels, multiplying path weights.
//
// `compose` is the plain cross product over state pairs. It is only correct
// when neither machine uses epsilon on the matched sides; `compose_eps` is
// the epsilon-safe entry point, which marks each side's epsilon moves with
// two synthetic priority labels, inserts a three-state filter between the
// machines so only one side takes epsilon steps at a time, and trims the
// result. The label augmentation mutates both inputs in place; that side
// effect is part of the contract.

use hashbrown::HashMap;
use std::collections::VecDeque;

use weft_core::arc::{EPSILON, Label, StateId};
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;

use crate::arc_sort;
use crate::connect;

/// Synthetic label marking "the second machine moves alone".
const EPS1_SYMBOL: &str = "<e1>";
/// Synthetic label marking "the first machine moves alone".
const EPS2_SYMBOL: &str = "<e2>";

/// Cross-product composition of two machines sharing a middle symbol table.
///
/// With `sorted` set, `b`'s arcs must be sorted by input label
/// ([`arc_sort::sort_by_input`]); the inner scan then stops at the first
/// arc past the matching label.
pub fn compose<S: Semiring>(
    a: &MutableFst<S>,
    b: &MutableFst<S>,
    sorted: bool,
) -> Result<MutableFst<S>, FstError> {
    if a.output_symbols() != b.input_symbols() {
        return Err(FstError::SymbolTableMismatch);
    }
    let start_a = a.require_start()?;
    let start_b = b.require_start()?;
    let ring = a.semiring().clone();

    let mut out = MutableFst::new(ring.clone());
    out.set_input_symbols(a.input_symbols().clone());
    out.set_output_symbols(b.output_symbols().clone());

    let mut pair_ids: HashMap<(StateId, StateId), StateId> = HashMap::new();
    let mut queue: VecDeque<(StateId, StateId)> = VecDeque::new();

    let start_pair = (start_a, start_b);
    let start_id = out.add_state();
    out.set_final(
        start_id,
        ring.times(a.final_weight(start_a), b.final_weight(start_b))?,
    )?;
    pair_ids.insert(start_pair, start_id);
    out.set_start(start_id)?;
    queue.push_back(start_pair);

    while let Some((sa, sb)) = queue.pop_front() {
        let src = pair_ids[&(sa, sb)];
        for arc_a in a.arcs(sa) {
            for arc_b in b.arcs(sb) {
                if sorted && arc_b.ilabel > arc_a.olabel {
                    break;
                }
                if arc_a.olabel != arc_b.ilabel {
                    continue;
                }
                let next_pair = (arc_a.next_state, arc_b.next_state);
                let dst = match pair_ids.get(&next_pair) {
                    Some(&id) => id,
                    None => {
                        let id = out.add_state();
                        out.set_final(
                            id,
                            ring.times(
                                a.final_weight(next_pair.0),
                                b.final_weight(next_pair.1),
                            )?,
                        )?;
                        pair_ids.insert(next_pair, id);
                        queue.push_back(next_pair);
                        id
                    }
                };
                out.add_arc(
                    src,
                    arc_a.ilabel,
                    arc_b.olabel,
                    ring.times(&arc_a.weight, &arc_b.weight)?,
                    dst,
                )?;
            }
        }
    }
    Ok(out)
}

/// Epsilon-safe composition.
///
/// Augments both inputs in place (see [`augment`]), builds the priority
/// filter over the shared middle alphabet, composes `A . F . B`, and trims.
pub fn compose_eps<S: Semiring>(
    a: &mut MutableFst<S>,
    b: &mut MutableFst<S>,
) -> Result<MutableFst<S>, FstError> {
    if a.output_symbols() != b.input_symbols() {
        return Err(FstError::SymbolTableMismatch);
    }
    a.require_start()?;
    b.require_start()?;

    let (e1, e2) = augment(LabelSide::Output, a)?;
    let (e1_b, e2_b) = augment(LabelSide::Input, b)?;
    // The tables were equal before augmentation, so the synthetic ids agree.
    debug_assert_eq!((e1, e2), (e1_b, e2_b));

    let mut filter = epsilon_filter(a, e1, e2)?;
    arc_sort::sort_by(&mut filter, |x, y| x.ilabel.cmp(&y.ilabel));
    arc_sort::sort_by(b, |x, y| x.ilabel.cmp(&y.ilabel));

    let half = compose(a, &filter, true)?;
    let mut full = compose(&half, b, true)?;
    connect::connect(&mut full)?;
    Ok(full)
}

/// Which side of a machine carries the matched labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    Input,
    Output,
}

/// Mark a machine's epsilon moves on the matched side with the two
/// synthetic priority labels. On the output side, every `<eps>` output
/// becomes `<e2>` and every state gets an `<eps>:<e1>` self-loop; on the
/// input side, every `<eps>` input becomes `<e1>` and every state gets an
/// `<e2>:<eps>` self-loop. Mutates the machine and its matched-side symbol
/// table in place; returns the two synthetic label ids.
pub fn augment<S: Semiring>(
    side: LabelSide,
    fst: &mut MutableFst<S>,
) -> Result<(Label, Label), FstError> {
    let ring = fst.semiring().clone();
    let (e1, e2) = match side {
        LabelSide::Output => {
            let table = fst.output_symbols_mut();
            (table.get_or_add(EPS1_SYMBOL), table.get_or_add(EPS2_SYMBOL))
        }
        LabelSide::Input => {
            let table = fst.input_symbols_mut();
            (table.get_or_add(EPS1_SYMBOL), table.get_or_add(EPS2_SYMBOL))
        }
    };

    for s in 0..fst.num_states() as StateId {
        for arc in fst.arcs_mut(s) {
            match side {
                LabelSide::Output if arc.olabel == EPSILON => arc.olabel = e2,
                LabelSide::Input if arc.ilabel == EPSILON => arc.ilabel = e1,
                _ => {}
            }
        }
    }
    for s in 0..fst.num_states() as StateId {
        match side {
            LabelSide::Output => fst.add_arc(s, EPSILON, e1, ring.one(), s)?,
            LabelSide::Input => fst.add_arc(s, e2, EPSILON, ring.one(), s)?,
        }
    }
    Ok((e1, e2))
}

/// The fixed three-state filter allowing only one machine to take epsilon
/// steps between real symbols. State 0 is neutral; state 1 means the second
/// machine is consuming its own epsilons; state 2 means the first machine
/// is. Real symbols always return to neutral.
fn epsilon_filter<S: Semiring>(
    a: &MutableFst<S>,
    e1: Label,
    e2: Label,
) -> Result<MutableFst<S>, FstError> {
    let ring = a.semiring().clone();
    let one = ring.one();
    let mut filter = MutableFst::new(ring.clone());
    filter.set_input_symbols(a.output_symbols().clone());
    filter.set_output_symbols(a.output_symbols().clone());

    let neutral = filter.add_state();
    let second_only = filter.add_state();
    let first_only = filter.add_state();
    filter.set_start(neutral)?;
    for s in [neutral, second_only, first_only] {
        filter.set_final(s, one.clone())?;
    }

    // A matched epsilon pair (first machine emits, second consumes) keeps
    // the filter neutral so both sides advance together.
    filter.add_arc(neutral, e2, e1, one.clone(), neutral)?;
    filter.add_arc(neutral, e1, e1, one.clone(), second_only)?;
    filter.add_arc(neutral, e2, e2, one.clone(), first_only)?;
    filter.add_arc(second_only, e1, e1, one.clone(), second_only)?;
    filter.add_arc(first_only, e2, e2, one.clone(), first_only)?;

    let labels: Vec<Label> = a
        .output_symbols()
        .iter()
        .map(|(id, _)| id)
        .filter(|&id| id != EPSILON && id != e1 && id != e2)
        .collect();
    for x in labels {
        filter.add_arc(neutral, x, x, one.clone(), neutral)?;
        filter.add_arc(second_only, x, x, one.clone(), neutral)?;
        filter.add_arc(first_only, x, x, one.clone(), neutral)?;
    }
    Ok(filter)
}
