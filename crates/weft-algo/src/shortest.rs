// Generalized shortest distance and n-shortest-paths.
//
// `shortest_distance` is the semiring-generic single-source relaxation: the
// distance to a state is the plus-sum over all paths from the start, which
// under the tropical ring is the classic shortest path. Relaxation runs a
// FIFO worklist with a separate "unpropagated mass" weight per state and
// terminates when updates fall inside the semiring tolerance; rings whose
// cycle weights do not converge will not terminate, which is the caller's
// contract to uphold.
//
// `n_shortest_paths` is best-first search guided by the exact
// distance-to-final of every state, so candidates pop in path-weight order
// and the n cheapest accepting paths come out as a result tree. It assumes
// the ring's `reverse` is the identity (true of all the primitive rings
// here) so to-final distances can be relaxed over reversed arcs directly.

use std::collections::VecDeque;

use weft_core::arc::{Label, StateId};
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;

use crate::connect;
use crate::extend_final;

/// Plus-sum over all paths from the start to every state. Index `i` of the
/// returned vector is the distance to state `i`; unreachable states get the
/// semiring zero.
pub fn shortest_distance<S: Semiring, F: FstView<S>>(fst: &F) -> Result<Vec<S::Weight>, FstError> {
    let Some(start) = fst.start() else {
        return Err(FstError::NoStartState);
    };
    let ring = fst.semiring().clone();
    let n = fst.num_states();

    let mut dist = vec![ring.zero(); n];
    let mut rest = vec![ring.zero(); n];
    let mut queued = vec![false; n];
    let mut queue = VecDeque::new();

    dist[start as usize] = ring.one();
    rest[start as usize] = ring.one();
    queued[start as usize] = true;
    queue.push_back(start);

    while let Some(s) = queue.pop_front() {
        queued[s as usize] = false;
        let mass = std::mem::replace(&mut rest[s as usize], ring.zero());
        for arc in fst.arcs(s) {
            let t = arc.next_state as usize;
            let relaxed = ring.times(&mass, &arc.weight)?;
            let updated = ring.plus(&dist[t], &relaxed)?;
            if ring.approx_eq(&dist[t], &updated) {
                continue;
            }
            dist[t] = updated;
            rest[t] = ring.plus(&rest[t], &relaxed)?;
            if !queued[t] {
                queued[t] = true;
                queue.push_back(arc.next_state);
            }
        }
    }
    Ok(dist)
}

/// Plus-sum over all paths from every state to a final state, including the
/// final weight. Relaxes over reversed arcs with unreversed weights, which
/// is exact when the ring's `reverse` is the identity.
fn distances_to_final<S: Semiring>(
    fst: &MutableFst<S>,
    superfinal: StateId,
) -> Result<Vec<S::Weight>, FstError> {
    let ring = fst.semiring().clone();
    let n = fst.num_states();

    let mut reverse_adj: Vec<Vec<(StateId, S::Weight)>> = vec![Vec::new(); n];
    for s in 0..n as StateId {
        for arc in fst.arcs(s) {
            reverse_adj[arc.next_state as usize].push((s, arc.weight.clone()));
        }
    }

    let mut dist = vec![ring.zero(); n];
    let mut rest = vec![ring.zero(); n];
    let mut queued = vec![false; n];
    let mut queue = VecDeque::new();

    dist[superfinal as usize] = ring.one();
    rest[superfinal as usize] = ring.one();
    queued[superfinal as usize] = true;
    queue.push_back(superfinal);

    while let Some(t) = queue.pop_front() {
        queued[t as usize] = false;
        let mass = std::mem::replace(&mut rest[t as usize], ring.zero());
        for (s, w) in &reverse_adj[t as usize] {
            let relaxed = ring.times(w, &mass)?;
            let updated = ring.plus(&dist[*s as usize], &relaxed)?;
            if ring.approx_eq(&dist[*s as usize], &updated) {
                continue;
            }
            dist[*s as usize] = updated;
            rest[*s as usize] = ring.plus(&rest[*s as usize], &relaxed)?;
            if !queued[*s as usize] {
                queued[*s as usize] = true;
                queue.push_back(*s);
            }
        }
    }
    Ok(dist)
}

/// One frontier entry of the best-first search: a prospective result state
/// for `state`, reached from the result state `parent` over the recorded
/// arc, with `cost` the accumulated weight from the start.
struct Candidate<W> {
    state: StateId,
    parent: Option<StateId>,
    ilabel: Label,
    olabel: Label,
    weight: W,
    cost: W,
}

/// The `n` cheapest accepting paths (by the ring's natural order), returned
/// as a tree-shaped machine whose paths are exactly those of the input with
/// the same labels and weights. Fewer than `n` paths are returned when the
/// input has fewer. The input is restored before returning.
pub fn n_shortest_paths<S: Semiring>(
    fst: &mut MutableFst<S>,
    n: usize,
) -> Result<MutableFst<S>, FstError> {
    let start = fst.require_start()?;
    let ring = fst.semiring().clone();

    let mut result = MutableFst::new(ring.clone());
    result.set_input_symbols(fst.input_symbols().clone());
    result.set_output_symbols(fst.output_symbols().clone());
    if n == 0 {
        return Ok(result);
    }

    let superfinal = extend_final::apply(fst)?;
    let searched = search(fst, &ring, start, superfinal, n, &mut result);
    extend_final::undo(fst)?;
    searched?;

    if result.start().is_some() {
        connect::connect(&mut result)?;
    }
    Ok(result)
}

fn search<S: Semiring>(
    fst: &MutableFst<S>,
    ring: &S,
    start: StateId,
    superfinal: StateId,
    n: usize,
    result: &mut MutableFst<S>,
) -> Result<(), FstError> {
    let dist = distances_to_final(fst, superfinal)?;
    if ring.is_zero(&dist[start as usize]) {
        // No accepting path at all.
        return Ok(());
    }

    let mut frontier: Vec<Candidate<S::Weight>> = vec![Candidate {
        state: start,
        parent: None,
        ilabel: 0,
        olabel: 0,
        weight: ring.one(),
        cost: ring.one(),
    }];
    let mut pops = vec![0usize; fst.num_states()];
    let mut found = 0usize;

    while let Some(cand) = pop_best(ring, &dist, &mut frontier)? {
        if pops[cand.state as usize] >= n {
            continue;
        }
        pops[cand.state as usize] += 1;

        if cand.state == superfinal {
            // The incoming arc is the epsilon arc ExtendFinal added; its
            // weight is the original final weight, so it becomes the result
            // state's final weight instead of an arc.
            let Some(parent) = cand.parent else {
                return Err(FstError::CorruptModel(
                    "n-shortest: accepting path with no states".to_string(),
                ));
            };
            let merged = ring.plus(result.final_weight(parent), &cand.weight)?;
            result.set_final(parent, merged)?;
            found += 1;
            if found >= n {
                break;
            }
            continue;
        }

        let rs = result.add_state();
        match cand.parent {
            Some(parent) => {
                result.add_arc(parent, cand.ilabel, cand.olabel, cand.weight.clone(), rs)?;
            }
            None => result.set_start(rs)?,
        }

        for arc in fst.arcs(cand.state) {
            if ring.is_zero(&dist[arc.next_state as usize]) {
                continue;
            }
            frontier.push(Candidate {
                state: arc.next_state,
                parent: Some(rs),
                ilabel: arc.ilabel,
                olabel: arc.olabel,
                weight: arc.weight.clone(),
                cost: ring.times(&cand.cost, &arc.weight)?,
            });
        }
    }
    Ok(())
}

/// Remove and return the frontier entry with the naturally smallest
/// estimated total weight `cost (*) dist[state]`. Linear scan; frontiers
/// stay small because pops are capped per state.
fn pop_best<S: Semiring>(
    ring: &S,
    dist: &[S::Weight],
    frontier: &mut Vec<Candidate<S::Weight>>,
) -> Result<Option<Candidate<S::Weight>>, FstError> {
    if frontier.is_empty() {
        return Ok(None);
    }
    let mut best = 0;
    let mut best_priority = ring.times(&frontier[0].cost, &dist[frontier[0].state as usize])?;
    for i in 1..frontier.len() {
        let priority = ring.times(&frontier[i].cost, &dist[frontier[i].state as usize])?;
        if ring.natural_less(&priority, &best_priority)? {
            best = i;
            best_priority = priority;
        }
    }
    Ok(Some(frontier.swap_remove(best)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::fst::fst_approx_eq;
    use weft_core::semiring::TropicalSemiring;

    /// Enumerate (input labels, total weight) over every accepting path of
    /// a tree-shaped machine.
    fn paths(fst: &MutableFst<TropicalSemiring>) -> Vec<(Vec<Label>, f64)> {
        fn go(
            fst: &MutableFst<TropicalSemiring>,
            state: StateId,
            labels: &mut Vec<Label>,
            cost: f64,
            out: &mut Vec<(Vec<Label>, f64)>,
        ) {
            if fst.is_final(state) {
                out.push((labels.clone(), cost + fst.final_weight(state)));
            }
            for arc in fst.arcs(state) {
                labels.push(arc.ilabel);
                go(fst, arc.next_state, labels, cost + arc.weight, out);
                labels.pop();
            }
        }
        let mut out = Vec::new();
        if let Some(start) = fst.start() {
            go(fst, start, &mut Vec::new(), 0.0, &mut out);
        }
        out.sort_by(|a, b| a.1.total_cmp(&b.1));
        out
    }

    #[test]
    fn distances_are_minimal_path_weights() {
        // Diamond: 0 -> 1 (1.0), 0 -> 2 (4.0), 1 -> 2 (1.0), 2 -> 3 (1.0).
        let mut fst = MutableFst::new(TropicalSemiring);
        let s: Vec<_> = (0..4).map(|_| fst.add_state()).collect();
        fst.set_start(s[0]).unwrap();
        fst.add_arc(s[0], 1, 1, 1.0, s[1]).unwrap();
        fst.add_arc(s[0], 2, 2, 4.0, s[2]).unwrap();
        fst.add_arc(s[1], 3, 3, 1.0, s[2]).unwrap();
        fst.add_arc(s[2], 4, 4, 1.0, s[3]).unwrap();
        fst.set_final(s[3], 0.0).unwrap();

        let d = shortest_distance(&fst).unwrap();
        assert_eq!(d, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn cycle_relaxation_converges_under_tropical() {
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, 1, 1, 2.0, s1).unwrap();
        fst.add_arc(s1, 2, 2, 1.0, s0).unwrap(); // positive cycle
        fst.set_final(s1, 0.0).unwrap();

        let d = shortest_distance(&fst).unwrap();
        assert_eq!(d, vec![0.0, 2.0]);
    }

    #[test]
    fn unreachable_states_stay_at_zero() {
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        fst.add_state(); // floating
        fst.set_start(s0).unwrap();
        let d = shortest_distance(&fst).unwrap();
        assert_eq!(d, vec![0.0, f64::INFINITY]);
    }

    /// Three accepting paths with costs 1.5, 2.5 and 6.0.
    fn three_path_machine() -> MutableFst<TropicalSemiring> {
        let mut fst = MutableFst::new(TropicalSemiring);
        let s: Vec<_> = (0..4).map(|_| fst.add_state()).collect();
        fst.set_start(s[0]).unwrap();
        fst.add_arc(s[0], 1, 1, 1.0, s[1]).unwrap();
        fst.add_arc(s[0], 2, 2, 2.0, s[2]).unwrap();
        fst.add_arc(s[0], 3, 3, 5.5, s[3]).unwrap();
        fst.add_arc(s[1], 4, 4, 0.0, s[3]).unwrap();
        fst.add_arc(s[2], 4, 4, 0.0, s[3]).unwrap();
        fst.set_final(s[3], 0.5).unwrap();
        fst
    }

    #[test]
    fn two_cheapest_paths_are_selected() {
        let mut fst = three_path_machine();
        let best = n_shortest_paths(&mut fst, 2).unwrap();
        let found = paths(&best);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], (vec![1, 4], 1.5));
        assert_eq!(found[1], (vec![2, 4], 2.5));
    }

    #[test]
    fn asking_for_more_paths_than_exist_returns_them_all() {
        let mut fst = three_path_machine();
        let best = n_shortest_paths(&mut fst, 10).unwrap();
        let found = paths(&best);
        assert_eq!(found.len(), 3);
        assert_eq!(found[2], (vec![3], 6.0));
    }

    #[test]
    fn zero_paths_requested_gives_an_empty_machine() {
        let mut fst = three_path_machine();
        let best = n_shortest_paths(&mut fst, 0).unwrap();
        assert_eq!(best.num_states(), 0);
        assert_eq!(best.start(), None);
    }

    #[test]
    fn input_is_restored_after_search() {
        let mut fst = three_path_machine();
        let original = MutableFst::copy_of(&fst);
        n_shortest_paths(&mut fst, 2).unwrap();
        assert!(fst_approx_eq(&original, &fst));
    }

    #[test]
    fn cycles_yield_ranked_loop_counts() {
        // Self-loop of weight 1 before a final arc: path costs 1, 2, 3, ...
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, 1, 1, 1.0, s0).unwrap();
        fst.add_arc(s0, 2, 2, 1.0, s1).unwrap();
        fst.set_final(s1, 0.0).unwrap();

        let best = n_shortest_paths(&mut fst, 3).unwrap();
        let found = paths(&best);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], (vec![2], 1.0));
        assert_eq!(found[1], (vec![1, 2], 2.0));
        assert_eq!(found[2], (vec![1, 1, 2], 3.0));
    }

    #[test]
    fn no_accepting_path_gives_an_empty_result() {
        let mut fst = MutableFst::new(TropicalSemiring);
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, 1, 1, 1.0, s1).unwrap();
        // No final state.
        let best = n_shortest_paths(&mut fst, 2).unwrap();
        assert_eq!(best.num_states(), 0);
    }
}
