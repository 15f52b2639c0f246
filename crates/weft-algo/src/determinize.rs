// Determinization by weighted subset construction.
//
// The transducer is treated as an acceptor over Gallic weights (pending
// output labels paired with the primitive weight), so output behavior rides
// along inside the weights. Each result state is a subset: a sorted list of
// source states, each carrying a union of unresolved Gallic residuals.
// Per input label the residuals' common divisor becomes the emitted arc
// weight and its first pending label the arc's output; what remains is
// divided out and interned as the successor subset.
//
// Because the common divisor factors at most one pending label at a time,
// residuals can still hold label backlogs when a subset is final. Those are
// unwound after the main loop into chains of synthetic states connected by
// input-epsilon arcs that emit one pending label each.

use hashbrown::HashMap;
use std::cmp::Ordering;
use std::collections::VecDeque;

use weft_core::arc::{EPSILON, Label, StateId};
use weft_core::error::FstError;
use weft_core::fst::{FstView, MutableFst};
use weft_core::gallic::{GallicMode, GallicSemiring, GallicWeight};
use weft_core::semiring::{DEFAULT_APPROX_DELTA, Semiring};
use weft_core::union_weight::{UnionElementOps, UnionSemiring, UnionWeight};

/// How non-functional input (one input path, several output paths) is
/// handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeterminizeMode {
    /// Assert the input is functional; fail with
    /// [`FstError::NonFunctional`] the moment it is not.
    Functional,
    /// Keep every output path. The result is deterministic on the input
    /// side only.
    NonFunctional,
    /// Keep, per input path, only the output path with the naturally
    /// smallest weight.
    Disambiguate,
}

type Residual = UnionWeight<GallicWeight<f64>>;

/// One subset member: a source state and its unresolved residual.
type Element = (StateId, Residual);

/// Hashable fingerprint of a subset, with weights quantized so float noise
/// within the tolerance does not split equivalent subsets.
type SubsetKey = Vec<(StateId, Vec<(Vec<Label>, i64)>)>;

/// Element order and merge rule for determinization residuals. Ordering is
/// by pending-label sequence; in collapse mode everything compares equal so
/// the Gallic min-plus folds the set down to its lightest member.
#[derive(Debug, Clone)]
struct ResidualOps<S: Semiring<Weight = f64>> {
    gallic: GallicSemiring<S>,
    collapse: bool,
}

impl<S: Semiring<Weight = f64>> UnionElementOps<GallicWeight<f64>> for ResidualOps<S> {
    fn compare(&self, a: &GallicWeight<f64>, b: &GallicWeight<f64>) -> Ordering {
        if self.collapse {
            Ordering::Equal
        } else {
            a.labels.cmp(&b.labels)
        }
    }

    fn merge(
        &self,
        a: &GallicWeight<f64>,
        b: &GallicWeight<f64>,
    ) -> Result<GallicWeight<f64>, FstError> {
        self.gallic.plus(a, b)
    }
}

/// Determinize over any primitive ring with `f64` weights: the result
/// accepts the same weighted relation and has at most one arc per
/// non-epsilon input label at every state. Input epsilon is grouped like
/// any other label; the final-unwinding chains emit leftover outputs over
/// input-epsilon arcs, one per surviving output, so those arcs may branch.
pub fn determinize<S: Semiring<Weight = f64>>(
    fst: &MutableFst<S>,
    mode: DeterminizeMode,
) -> Result<MutableFst<S>, FstError> {
    let start = fst.require_start()?;
    let ring = fst.semiring().clone();
    let gallic_mode = match mode {
        DeterminizeMode::Disambiguate => GallicMode::Min,
        _ => GallicMode::Restrict,
    };
    let gallic = GallicSemiring::new(ring.clone(), gallic_mode);
    let ops = ResidualOps {
        gallic: gallic.clone(),
        collapse: mode == DeterminizeMode::Disambiguate,
    };
    let union = UnionSemiring::new(gallic.clone(), ops, mode == DeterminizeMode::Functional);

    let mut out = MutableFst::new(ring.clone());
    out.set_input_symbols(fst.input_symbols().clone());
    out.set_output_symbols(fst.output_symbols().clone());

    let mut subsets: HashMap<SubsetKey, StateId> = HashMap::new();
    let mut queue: VecDeque<(StateId, Vec<Element>)> = VecDeque::new();
    let mut deferred_finals: VecDeque<(StateId, Residual)> = VecDeque::new();

    let start_subset = vec![(start, union.one())];
    let start_id = out.add_state();
    subsets.insert(subset_key(&start_subset), start_id);
    out.set_start(start_id)?;
    queue.push_back((start_id, start_subset));

    while let Some((src, subset)) = queue.pop_front() {
        // Final behavior of the subset: every member's residual times its
        // source state's final weight, summed.
        let mut final_residual = union.zero();
        for (state, residual) in &subset {
            let fw = fst.final_weight(*state);
            if ring.is_zero(fw) {
                continue;
            }
            let lifted = Residual::singleton(GallicWeight::label_free(fw.clone()));
            final_residual = union.plus(&final_residual, &union.times(residual, &lifted)?)?;
        }
        if !union.is_zero(&final_residual) {
            deferred_finals.push_back((src, final_residual));
        }

        // Group arcs by input label, accumulating one residual per
        // destination state.
        let mut by_label: HashMap<Label, Vec<Element>> = HashMap::new();
        for (state, residual) in &subset {
            for arc in fst.arcs(*state) {
                let labels = if arc.olabel == EPSILON {
                    Vec::new()
                } else {
                    vec![arc.olabel]
                };
                let step = Residual::singleton(GallicWeight::new(labels, arc.weight));
                let contribution = union.times(residual, &step)?;
                let group = by_label.entry(arc.ilabel).or_default();
                match group.iter_mut().find(|(s, _)| *s == arc.next_state) {
                    Some((_, existing)) => *existing = union.plus(existing, &contribution)?,
                    None => group.push((arc.next_state, contribution)),
                }
            }
        }

        let mut labels: Vec<Label> = by_label.keys().copied().collect();
        labels.sort_unstable();
        for ilabel in labels {
            let mut group = by_label.remove(&ilabel).unwrap_or_default();
            group.sort_unstable_by_key(|&(s, _)| s);

            let mut divisor = union.zero();
            for (_, residual) in &group {
                divisor = union.common_divisor(&divisor, residual)?;
            }
            let head = match divisor.elements() {
                [g] => g.clone(),
                _ => {
                    return Err(FstError::CorruptModel(
                        "determinize: common divisor of a non-empty group is empty".to_string(),
                    ));
                }
            };

            let mut next_subset = Vec::with_capacity(group.len());
            for (state, residual) in group {
                next_subset.push((state, union.divide(&residual, &divisor)?));
            }

            let key = subset_key(&next_subset);
            let dst = match subsets.get(&key) {
                Some(&id) => id,
                None => {
                    let id = out.add_state();
                    subsets.insert(key, id);
                    queue.push_back((id, next_subset));
                    id
                }
            };
            let olabel = head.labels.first().copied().unwrap_or(EPSILON);
            out.add_arc(src, ilabel, olabel, head.weight, dst)?;
        }
    }

    unwind_finals(&mut out, &ring, &gallic, deferred_finals)?;
    Ok(out)
}

/// Resolve deferred final residuals. Label-free residual elements fold into
/// the state's final weight; elements still holding pending labels grow a
/// chain of synthetic states whose input-epsilon arcs emit one label each.
fn unwind_finals<S: Semiring<Weight = f64>>(
    out: &mut MutableFst<S>,
    ring: &S,
    gallic: &GallicSemiring<S>,
    mut deferred: VecDeque<(StateId, Residual)>,
) -> Result<(), FstError> {
    while let Some((state, residual)) = deferred.pop_front() {
        let mut final_weight = out.final_weight(state).clone();
        for g in residual.elements() {
            if g.is_label_free() {
                final_weight = ring.plus(&final_weight, &g.weight)?;
                continue;
            }
            let (head, tail) = gallic.factorize(g);
            let next = out.add_state();
            out.add_arc(state, EPSILON, head.labels[0], head.weight, next)?;
            deferred.push_back((next, Residual::singleton(tail)));
        }
        out.set_final(state, final_weight)?;
    }
    Ok(())
}

fn subset_key(subset: &[Element]) -> SubsetKey {
    subset
        .iter()
        .map(|(state, residual)| {
            let quantized = residual
                .elements()
                .iter()
                .map(|g| (g.labels.clone(), quantize(g.weight)))
                .collect();
            (*state, quantized)
        })
        .collect()
}

fn quantize(w: f64) -> i64 {
    if w.is_infinite() {
        return if w > 0.0 { i64::MAX } else { i64::MIN };
    }
    (w / DEFAULT_APPROX_DELTA).round() as i64
}
