// Epsilon removal: an equivalent machine with no `<eps>:<eps>` arcs.
//
// For every state the weighted epsilon closure is computed by worklist
// relaxation (so epsilon cycles converge under semirings where the cycle
// weight's star is the fixed point of `plus`), then each closure member's
// non-epsilon arcs and final weight are re-emitted at the source state with
// the closure weight times'd in. Finishes with a trim and an input-label
// sort, so the result is ready for sorted composition.

use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

use weft_core::arc::StateId;
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;

use crate::arc_sort;
use crate::connect;

/// Build an epsilon-free equivalent of `fst`.
pub fn rm_epsilon<S>(fst: &MutableFst<S>) -> Result<MutableFst<S>, FstError>
where
    S: Semiring,
    S::Weight: PartialOrd,
{
    let start = fst.require_start()?;
    let ring = fst.semiring().clone();

    let mut out = MutableFst::new(ring.clone());
    out.set_input_symbols(fst.input_symbols().clone());
    out.set_output_symbols(fst.output_symbols().clone());
    for _ in 0..fst.num_states() {
        out.add_state();
    }
    out.set_start(start)?;

    for s in 0..fst.num_states() as StateId {
        // Non-epsilon arcs survive as-is.
        for arc in fst.arcs(s) {
            if !arc.is_epsilon() {
                out.add_arc(s, arc.ilabel, arc.olabel, arc.weight.clone(), arc.next_state)?;
            }
        }

        let mut final_weight = fst.final_weight(s).clone();
        for (t, chain) in epsilon_closure(fst, s, &ring)? {
            for arc in fst.arcs(t) {
                if arc.is_epsilon() {
                    continue;
                }
                out.add_arc(
                    s,
                    arc.ilabel,
                    arc.olabel,
                    ring.times(&chain, &arc.weight)?,
                    arc.next_state,
                )?;
            }
            final_weight = ring.plus(&final_weight, &ring.times(&chain, fst.final_weight(t))?)?;
        }
        out.set_final(s, final_weight)?;
    }

    connect::connect(&mut out)?;
    arc_sort::sort_by_input(&mut out);
    Ok(out)
}

/// Weighted epsilon closure of `state`: every state reachable over one or
/// more epsilon arcs, with the plus-sum over all epsilon chains as weight.
/// `state` itself appears only if an epsilon cycle returns to it. Each pop
/// propagates only the mass accumulated since the last pop (the same
/// discipline as [`shortest_distance`](crate::shortest::shortest_distance)),
/// so no chain is counted twice under non-idempotent rings. Relaxation
/// stops when a distance update falls within the semiring tolerance.
fn epsilon_closure<S: Semiring>(
    fst: &MutableFst<S>,
    state: StateId,
    ring: &S,
) -> Result<Vec<(StateId, S::Weight)>, FstError> {
    let mut dist: HashMap<StateId, S::Weight> = HashMap::new();
    let mut rest: HashMap<StateId, S::Weight> = HashMap::new();
    let mut queued: HashSet<StateId> = HashSet::new();
    let mut queue: VecDeque<StateId> = VecDeque::new();

    for arc in fst.arcs(state) {
        if arc.is_epsilon() {
            relax(
                ring,
                &mut dist,
                &mut rest,
                &mut queued,
                &mut queue,
                arc.next_state,
                &arc.weight,
            )?;
        }
    }

    while let Some(t) = queue.pop_front() {
        queued.remove(&t);
        let Some(mass) = rest.insert(t, ring.zero()) else {
            continue;
        };
        for arc in fst.arcs(t) {
            if !arc.is_epsilon() {
                continue;
            }
            let relaxed = ring.times(&mass, &arc.weight)?;
            relax(
                ring,
                &mut dist,
                &mut rest,
                &mut queued,
                &mut queue,
                arc.next_state,
                &relaxed,
            )?;
        }
    }

    let mut closure: Vec<(StateId, S::Weight)> = dist.into_iter().collect();
    closure.sort_unstable_by_key(|&(t, _)| t);
    Ok(closure)
}

fn relax<S: Semiring>(
    ring: &S,
    dist: &mut HashMap<StateId, S::Weight>,
    rest: &mut HashMap<StateId, S::Weight>,
    queued: &mut HashSet<StateId>,
    queue: &mut VecDeque<StateId>,
    target: StateId,
    delta: &S::Weight,
) -> Result<(), FstError> {
    let entry = dist.entry(target).or_insert_with(|| ring.zero());
    let updated = ring.plus(entry, delta)?;
    if ring.approx_eq(entry, &updated) {
        return Ok(());
    }
    *entry = updated;
    let pending = rest.entry(target).or_insert_with(|| ring.zero());
    *pending = ring.plus(pending, delta)?;
    if queued.insert(target) {
        queue.push_back(target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::arc::EPSILON;
    use weft_core::semiring::{LogSemiring, TropicalSemiring};

    #[test]
    fn epsilon_chain_collapses_onto_source() {
        // 0 -eps/1-> 1 -eps/2-> 2 -a/3-> 3(final 0)
        let mut fst = MutableFst::new(TropicalSemiring);
        let s: Vec<_> = (0..4).map(|_| fst.add_state()).collect();
        fst.set_start(s[0]).unwrap();
        fst.add_arc(s[0], EPSILON, EPSILON, 1.0, s[1]).unwrap();
        fst.add_arc(s[1], EPSILON, EPSILON, 2.0, s[2]).unwrap();
        fst.add_arc(s[2], 1, 1, 3.0, s[3]).unwrap();
        fst.set_final(s[3], 0.0).unwrap();

        let out = rm_epsilon(&fst).unwrap();

        for q in 0..out.num_states() as StateId {
            for arc in out.arcs(q) {
                assert!(!arc.is_epsilon());
            }
        }
        // The start now carries the whole chain: a/6 straight to the final.
        let start = out.start().unwrap();
        let arc = out
            .arcs(start)
            .iter()
            .find(|a| a.ilabel == 1)
            .expect("relocated arc");
        assert_eq!(arc.weight, 6.0);
        assert!(out.is_final(arc.next_state));
    }

    #[test]
    fn epsilon_path_to_a_final_state_makes_the_source_final() {
        // 0 -eps/2-> 1(final 3): state 0 must become final with weight 5.
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, EPSILON, EPSILON, 2.0, s1).unwrap();
        fst.set_final(s1, 3.0).unwrap();

        let out = rm_epsilon(&fst).unwrap();
        let start = out.start().unwrap();
        assert!(out.is_final(start));
        assert_eq!(*out.final_weight(start), 5.0);
    }

    #[test]
    fn parallel_epsilon_paths_take_the_plus_sum() {
        // Two epsilon routes from 0 to 2 with weights 4 and 1+2; tropical
        // plus picks 3. Then 2 -b/1-> 3(final).
        let mut fst = MutableFst::new(TropicalSemiring);
        let s: Vec<_> = (0..4).map(|_| fst.add_state()).collect();
        fst.set_start(s[0]).unwrap();
        fst.add_arc(s[0], EPSILON, EPSILON, 4.0, s[2]).unwrap();
        fst.add_arc(s[0], EPSILON, EPSILON, 1.0, s[1]).unwrap();
        fst.add_arc(s[1], EPSILON, EPSILON, 2.0, s[2]).unwrap();
        fst.add_arc(s[2], 2, 2, 1.0, s[3]).unwrap();
        fst.set_final(s[3], 0.0).unwrap();

        let out = rm_epsilon(&fst).unwrap();
        let start = out.start().unwrap();
        let weights: Vec<f64> = out
            .arcs(start)
            .iter()
            .filter(|a| a.ilabel == 2)
            .map(|a| a.weight)
            .collect();
        assert_eq!(weights, vec![4.0]); // min(4, 3) (+) arc weight 1
    }

    #[test]
    fn parallel_epsilon_mass_is_counted_once_under_log() {
        // 0 -eps/0.5-> 1 (twice), 1 -eps/0.5-> 2, 2 -a/0.5-> 3(final 0).
        // The closure weight to 2 is (0.5 (+) 0.5) (*) 0.5 = 1.0 - ln 2 in
        // the log ring; re-propagating a state's full distance on every pop
        // would double the parallel mass to 1.0 - ln 4.
        let mut fst = MutableFst::new(LogSemiring);
        let s: Vec<_> = (0..4).map(|_| fst.add_state()).collect();
        fst.set_start(s[0]).unwrap();
        fst.add_arc(s[0], EPSILON, EPSILON, 0.5, s[1]).unwrap();
        fst.add_arc(s[0], EPSILON, EPSILON, 0.5, s[1]).unwrap();
        fst.add_arc(s[1], EPSILON, EPSILON, 0.5, s[2]).unwrap();
        fst.add_arc(s[2], 1, 1, 0.5, s[3]).unwrap();
        fst.set_final(s[3], 0.0).unwrap();

        let out = rm_epsilon(&fst).unwrap();
        let start = out.start().unwrap();
        let arc = out
            .arcs(start)
            .iter()
            .find(|a| a.ilabel == 1)
            .expect("relocated arc");
        let want = 1.5 - 2.0_f64.ln();
        assert!((arc.weight - want).abs() < 1e-9);
    }

    #[test]
    fn epsilon_self_cycle_converges_under_tropical() {
        // 0 -eps/1-> 0 (cycle) and 0 -a/1-> 1(final). The cycle cannot
        // improve anything under min-plus, so removal terminates and the
        // non-epsilon arc survives unchanged.
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, EPSILON, EPSILON, 1.0, s0).unwrap();
        fst.add_arc(s0, 1, 1, 1.0, s1).unwrap();
        fst.set_final(s1, 0.0).unwrap();

        let out = rm_epsilon(&fst).unwrap();
        let start = out.start().unwrap();
        // Original arc plus the re-emitted copy through the cycle; both on
        // label 1, with the direct one cheapest.
        assert!(out.arcs(start).iter().all(|a| a.ilabel == 1));
        assert!(out.arcs(start).iter().any(|a| a.weight == 1.0));
    }

    #[test]
    fn requires_a_start_state() {
        let mut fst: MutableFst<TropicalSemiring> = MutableFst::new(TropicalSemiring);
        fst.add_state();
        assert!(matches!(
            rm_epsilon(&fst).unwrap_err(),
            FstError::NoStartState
        ));
    }
}
