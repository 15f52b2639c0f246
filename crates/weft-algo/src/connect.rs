// Connect (trim): drop states that are not on any start-to-final path.
//
// A state survives iff it is accessible (reachable from the start) and
// coaccessible (some final state is reachable from it). Both traversals use
// explicit worklists; self-loops and longer cycles are handled by the
// visited marks. Survivors are densely renumbered and arcs into deleted
// states are dropped.

use hashbrown::HashSet;

use weft_core::arc::StateId;
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::semiring::Semiring;

/// Trim the transducer in place. Errors if no start state is set.
pub fn connect<S: Semiring>(fst: &mut MutableFst<S>) -> Result<(), FstError> {
    let start = fst.require_start()?;
    let n = fst.num_states();

    // Accessibility: DFS from the start.
    let mut accessible = vec![false; n];
    let mut stack = vec![start];
    accessible[start as usize] = true;
    while let Some(s) = stack.pop() {
        for arc in fst.arcs(s) {
            if !accessible[arc.next_state as usize] {
                accessible[arc.next_state as usize] = true;
                stack.push(arc.next_state);
            }
        }
    }

    // Coaccessibility: walk the reversed adjacency from every final state.
    let mut reverse_adj: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for s in 0..n as StateId {
        for arc in fst.arcs(s) {
            reverse_adj[arc.next_state as usize].push(s);
        }
    }
    let mut coaccessible = vec![false; n];
    let mut stack: Vec<StateId> = (0..n as StateId)
        .filter(|&s| fst.is_final(s))
        .collect();
    for &s in &stack {
        coaccessible[s as usize] = true;
    }
    while let Some(s) = stack.pop() {
        for &pred in &reverse_adj[s as usize] {
            if !coaccessible[pred as usize] {
                coaccessible[pred as usize] = true;
                stack.push(pred);
            }
        }
    }

    let dead: HashSet<StateId> = (0..n as StateId)
        .filter(|&s| !(accessible[s as usize] && coaccessible[s as usize]))
        .collect();
    fst.delete_states(&dead);
    Ok(())
}
