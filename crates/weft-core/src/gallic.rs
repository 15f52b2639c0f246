// Gallic weights: an output-label sequence paired with an inner weight.
//
// Encoding a transducer's output behavior as an automaton weight is what
// lets determinization treat a transducer as a weighted acceptor. `times`
// concatenates label sequences; `plus` depends on the mode (see
// `GallicMode`).

use crate::arc::Label;
use crate::error::FstError;
use crate::semiring::Semiring;

/// A label sequence plus an inner primitive weight. Immutable value object.
#[derive(Debug, Clone, PartialEq)]
pub struct GallicWeight<W> {
    pub labels: Vec<Label>,
    pub weight: W,
}

impl<W> GallicWeight<W> {
    pub fn new(labels: Vec<Label>, weight: W) -> Self {
        Self { labels, weight }
    }

    /// A weight with no pending output labels.
    pub fn label_free(weight: W) -> Self {
        Self {
            labels: Vec::new(),
            weight,
        }
    }

    pub fn single(label: Label, weight: W) -> Self {
        Self {
            labels: vec![label],
            weight,
        }
    }

    /// True if no output labels are pending.
    pub fn is_label_free(&self) -> bool {
        self.labels.is_empty()
    }
}

/// How `plus` resolves two weights with different label sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GallicMode {
    /// Unequal label sequences are an error. Used when every input path is
    /// known to carry at most one output path.
    Restrict,
    /// Keep the operand whose inner weight is naturally smaller, discarding
    /// the other's labels. Used to disambiguate non-functional input.
    Min,
}

/// Product semiring of a label string (concatenation) and an inner ring.
#[derive(Debug, Clone)]
pub struct GallicSemiring<S: Semiring> {
    inner: S,
    mode: GallicMode,
}

impl<S: Semiring> GallicSemiring<S> {
    pub fn new(inner: S, mode: GallicMode) -> Self {
        Self { inner, mode }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn mode(&self) -> GallicMode {
        self.mode
    }

    /// Split a weight into a head carrying at most one label together with
    /// the full inner weight, and a label-only tail. Used to unwind deferred
    /// final weights into chains of synthetic arcs.
    pub fn factorize(
        &self,
        w: &GallicWeight<S::Weight>,
    ) -> (GallicWeight<S::Weight>, GallicWeight<S::Weight>) {
        if w.labels.is_empty() {
            return (
                GallicWeight::label_free(w.weight.clone()),
                GallicWeight::label_free(self.inner.one()),
            );
        }
        let head = GallicWeight::single(w.labels[0], w.weight.clone());
        let tail = GallicWeight::new(w.labels[1..].to_vec(), self.inner.one());
        (head, tail)
    }
}

impl<S: Semiring> Semiring for GallicSemiring<S> {
    type Weight = GallicWeight<S::Weight>;

    fn plus(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError> {
        if self.is_zero(a) {
            return Ok(b.clone());
        }
        if self.is_zero(b) {
            return Ok(a.clone());
        }
        match self.mode {
            GallicMode::Restrict => {
                if a.labels != b.labels {
                    return Err(FstError::GallicRestrictViolation);
                }
                Ok(GallicWeight::new(
                    a.labels.clone(),
                    self.inner.plus(&a.weight, &b.weight)?,
                ))
            }
            GallicMode::Min => {
                if self.inner.natural_less(&b.weight, &a.weight)? {
                    Ok(b.clone())
                } else {
                    Ok(a.clone())
                }
            }
        }
    }

    fn times(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError> {
        let mut labels = Vec::with_capacity(a.labels.len() + b.labels.len());
        labels.extend_from_slice(&a.labels);
        labels.extend_from_slice(&b.labels);
        Ok(GallicWeight::new(
            labels,
            self.inner.times(&a.weight, &b.weight)?,
        ))
    }

    /// Left division: strips `b`'s label sequence off `a`'s prefix and
    /// divides the inner weights.
    fn divide(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError> {
        if self.is_zero(b) {
            return Err(FstError::DivideByZero);
        }
        if !a.labels.starts_with(&b.labels) {
            return Err(FstError::CorruptModel(format!(
                "gallic divide: {:?} is not a prefix of {:?}",
                b.labels, a.labels
            )));
        }
        Ok(GallicWeight::new(
            a.labels[b.labels.len()..].to_vec(),
            self.inner.divide(&a.weight, &b.weight)?,
        ))
    }

    fn zero(&self) -> Self::Weight {
        GallicWeight::label_free(self.inner.zero())
    }

    fn one(&self) -> Self::Weight {
        GallicWeight::label_free(self.inner.one())
    }

    fn is_member(&self, a: &Self::Weight) -> bool {
        self.inner.is_member(&a.weight)
    }

    fn approx_eq(&self, a: &Self::Weight, b: &Self::Weight) -> bool {
        a.labels == b.labels && self.inner.approx_eq(&a.weight, &b.weight)
    }

    fn is_zero(&self, a: &Self::Weight) -> bool {
        self.inner.is_zero(&a.weight)
    }

    fn reverse(&self, a: &Self::Weight) -> Result<Self::Weight, FstError> {
        let mut labels = a.labels.clone();
        labels.reverse();
        Ok(GallicWeight::new(labels, self.inner.reverse(&a.weight)?))
    }

    /// Shared leading component of two weights. The label part is limited
    /// to a prefix of length <= 1 (longer shared prefixes are deliberately
    /// not factored); the weight part is the inner `plus`.
    fn common_divisor(
        &self,
        a: &Self::Weight,
        b: &Self::Weight,
    ) -> Result<Self::Weight, FstError> {
        if self.is_zero(a) && self.is_zero(b) {
            return Ok(self.zero());
        }
        if self.is_zero(a) {
            let (head, _) = self.factorize(b);
            return Ok(head);
        }
        if self.is_zero(b) {
            let (head, _) = self.factorize(a);
            return Ok(head);
        }
        let labels = match (a.labels.first(), b.labels.first()) {
            (Some(&la), Some(&lb)) if la == lb => vec![la],
            _ => Vec::new(),
        };
        Ok(GallicWeight::new(
            labels,
            self.inner.plus(&a.weight, &b.weight)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalSemiring;

    fn restrict() -> GallicSemiring<TropicalSemiring> {
        GallicSemiring::new(TropicalSemiring, GallicMode::Restrict)
    }

    fn min_mode() -> GallicSemiring<TropicalSemiring> {
        GallicSemiring::new(TropicalSemiring, GallicMode::Min)
    }

    #[test]
    fn times_concatenates_labels() {
        let g = restrict();
        let a = GallicWeight::new(vec![1, 2], 1.0);
        let b = GallicWeight::new(vec![3], 2.0);
        let ab = g.times(&a, &b).unwrap();
        assert_eq!(ab.labels, vec![1, 2, 3]);
        assert_eq!(ab.weight, 3.0);
    }

    #[test]
    fn restrict_plus_requires_equal_labels() {
        let g = restrict();
        let a = GallicWeight::new(vec![1], 1.0);
        let b = GallicWeight::new(vec![1], 2.0);
        let sum = g.plus(&a, &b).unwrap();
        assert_eq!(sum.labels, vec![1]);
        assert_eq!(sum.weight, 1.0); // tropical min

        let c = GallicWeight::new(vec![2], 2.0);
        let err = g.plus(&a, &c).unwrap_err();
        assert!(matches!(err, FstError::GallicRestrictViolation));
    }

    #[test]
    fn restrict_plus_with_zero_is_identity() {
        let g = restrict();
        let a = GallicWeight::new(vec![1, 2], 1.0);
        let sum = g.plus(&a, &g.zero()).unwrap();
        assert!(g.approx_eq(&sum, &a));
    }

    #[test]
    fn min_plus_keeps_the_lighter_path() {
        let g = min_mode();
        let a = GallicWeight::new(vec![1], 5.0);
        let b = GallicWeight::new(vec![2, 3], 2.0);
        let sum = g.plus(&a, &b).unwrap();
        assert_eq!(sum.labels, vec![2, 3]);
        assert_eq!(sum.weight, 2.0);
    }

    #[test]
    fn divide_strips_the_prefix() {
        let g = restrict();
        let a = GallicWeight::new(vec![1, 2, 3], 5.0);
        let b = GallicWeight::new(vec![1, 2], 2.0);
        let q = g.divide(&a, &b).unwrap();
        assert_eq!(q.labels, vec![3]);
        assert_eq!(q.weight, 3.0);
    }

    #[test]
    fn divide_rejects_non_prefix() {
        let g = restrict();
        let a = GallicWeight::new(vec![1, 2], 5.0);
        let b = GallicWeight::new(vec![2], 2.0);
        assert!(g.divide(&a, &b).is_err());
    }

    #[test]
    fn common_divisor_is_limited_to_one_label() {
        let g = restrict();
        let a = GallicWeight::new(vec![1, 2, 3], 3.0);
        let b = GallicWeight::new(vec![1, 2, 4], 5.0);
        let d = g.common_divisor(&a, &b).unwrap();
        // Shared prefix is [1, 2] but only the first label is factored.
        assert_eq!(d.labels, vec![1]);
        assert_eq!(d.weight, 3.0);

        let c = GallicWeight::new(vec![9], 1.0);
        let d2 = g.common_divisor(&a, &c).unwrap();
        assert!(d2.labels.is_empty());
        assert_eq!(d2.weight, 1.0);
    }

    #[test]
    fn common_divisor_divides_both_operands() {
        let g = restrict();
        let a = GallicWeight::new(vec![1, 2], 3.0);
        let b = GallicWeight::new(vec![1, 3], 5.0);
        let d = g.common_divisor(&a, &b).unwrap();
        let ra = g.divide(&a, &d).unwrap();
        let rb = g.divide(&b, &d).unwrap();
        assert_eq!(ra.labels, vec![2]);
        assert_eq!(rb.labels, vec![3]);
        // Re-multiplying restores the originals.
        assert!(g.approx_eq(&g.times(&d, &ra).unwrap(), &a));
        assert!(g.approx_eq(&g.times(&d, &rb).unwrap(), &b));
    }

    #[test]
    fn factorize_splits_head_and_tail() {
        let g = restrict();
        let w = GallicWeight::new(vec![4, 5, 6], 2.5);
        let (head, tail) = g.factorize(&w);
        assert_eq!(head.labels, vec![4]);
        assert_eq!(head.weight, 2.5);
        assert_eq!(tail.labels, vec![5, 6]);
        assert_eq!(tail.weight, 0.0); // tropical one
        // head * tail == w
        assert!(g.approx_eq(&g.times(&head, &tail).unwrap(), &w));
    }

    #[test]
    fn reverse_reverses_labels() {
        let g = restrict();
        let w = GallicWeight::new(vec![1, 2, 3], 1.0);
        let r = g.reverse(&w).unwrap();
        assert_eq!(r.labels, vec![3, 2, 1]);
    }
}
