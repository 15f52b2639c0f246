// Union weights: a finite, sorted, deduplicated set of inner weights under
// "union as plus" semantics.
//
// Determinization uses these to carry several unresolved residuals at once.
// The element ordering and the rule for merging equal elements are supplied
// by the caller through `UnionElementOps`, since they differ per use
// (restrict-merge for functional input, min-collapse for disambiguation).

use std::cmp::Ordering;

use crate::error::FstError;
use crate::semiring::Semiring;

/// An immutable sorted set of weights of some inner semiring.
/// The empty set is the union zero.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionWeight<W> {
    elements: Vec<W>,
}

impl<W> UnionWeight<W> {
    /// The empty set.
    pub fn zero() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn singleton(w: W) -> Self {
        Self { elements: vec![w] }
    }

    pub fn elements(&self) -> &[W] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Ordering and merge strategy for union elements.
pub trait UnionElementOps<W>: Clone + std::fmt::Debug {
    /// Total order over elements. Elements comparing `Equal` are merged.
    fn compare(&self, a: &W, b: &W) -> Ordering;

    /// Combine two elements that compare `Equal` into one.
    fn merge(&self, a: &W, b: &W) -> Result<W, FstError>;
}

/// "Union as plus" semiring over sorted sets of inner weights.
///
/// In restricted mode any operation producing a set of more than one
/// element fails with [`FstError::NonFunctional`] -- this turns union
/// semantics into an assertion that the input behaves functionally.
#[derive(Debug, Clone)]
pub struct UnionSemiring<S: Semiring, O: UnionElementOps<S::Weight>> {
    inner: S,
    ops: O,
    restricted: bool,
}

impl<S: Semiring, O: UnionElementOps<S::Weight>> UnionSemiring<S, O> {
    pub fn new(inner: S, ops: O, restricted: bool) -> Self {
        Self {
            inner,
            ops,
            restricted,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Normalize a list of raw elements into a weight: drop zeros, sort by
    /// the element order, merge equals, enforce the restricted-size rule.
    pub fn weight_from(&self, elements: Vec<S::Weight>) -> Result<UnionWeight<S::Weight>, FstError> {
        let mut result = UnionWeight::zero();
        for e in elements {
            result = self.insert(result, e)?;
        }
        self.check_restricted(&result)?;
        Ok(result)
    }

    /// Insert one element into a sorted set, merging on equality.
    fn insert(
        &self,
        mut set: UnionWeight<S::Weight>,
        e: S::Weight,
    ) -> Result<UnionWeight<S::Weight>, FstError> {
        if self.inner.is_zero(&e) {
            return Ok(set);
        }
        match set
            .elements
            .binary_search_by(|probe| self.ops.compare(probe, &e))
        {
            Ok(i) => {
                let merged = self.ops.merge(&set.elements[i], &e)?;
                if self.inner.is_zero(&merged) {
                    set.elements.remove(i);
                } else {
                    set.elements[i] = merged;
                }
            }
            Err(i) => set.elements.insert(i, e),
        }
        Ok(set)
    }

    fn check_restricted(&self, w: &UnionWeight<S::Weight>) -> Result<(), FstError> {
        if self.restricted && w.len() > 1 {
            return Err(FstError::NonFunctional(format!(
                "restricted union grew to {} elements",
                w.len()
            )));
        }
        Ok(())
    }
}

impl<S: Semiring, O: UnionElementOps<S::Weight>> Semiring for UnionSemiring<S, O> {
    type Weight = UnionWeight<S::Weight>;

    fn plus(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError> {
        let mut result = a.clone();
        for e in &b.elements {
            result = self.insert(result, e.clone())?;
        }
        self.check_restricted(&result)?;
        Ok(result)
    }

    /// Full pairwise cross product of the inner `times`, re-unioned.
    fn times(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError> {
        let mut result = UnionWeight::zero();
        for ea in &a.elements {
            for eb in &b.elements {
                result = self.insert(result, self.inner.times(ea, eb)?)?;
            }
        }
        self.check_restricted(&result)?;
        Ok(result)
    }

    /// Defined only when the divisor is a singleton set.
    fn divide(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError> {
        let [divisor] = b.elements.as_slice() else {
            return Err(FstError::UnsupportedOperation(
                "union divide by a non-singleton set",
            ));
        };
        let mut result = UnionWeight::zero();
        for e in &a.elements {
            result = self.insert(result, self.inner.divide(e, divisor)?)?;
        }
        Ok(result)
    }

    fn zero(&self) -> Self::Weight {
        UnionWeight::zero()
    }

    fn one(&self) -> Self::Weight {
        UnionWeight::singleton(self.inner.one())
    }

    fn is_member(&self, a: &Self::Weight) -> bool {
        a.elements.iter().all(|e| self.inner.is_member(e))
    }

    fn approx_eq(&self, a: &Self::Weight, b: &Self::Weight) -> bool {
        a.len() == b.len()
            && a.elements
                .iter()
                .zip(&b.elements)
                .all(|(x, y)| self.inner.approx_eq(x, y))
    }

    fn is_zero(&self, a: &Self::Weight) -> bool {
        a.is_empty()
    }

    /// Folds the inner `common_divisor` across every element of both sets,
    /// yielding a singleton that divides all of them.
    fn common_divisor(
        &self,
        a: &Self::Weight,
        b: &Self::Weight,
    ) -> Result<Self::Weight, FstError> {
        let mut acc: Option<S::Weight> = None;
        for e in a.elements.iter().chain(&b.elements) {
            acc = Some(match acc {
                None => self.inner.common_divisor(e, &self.inner.zero())?,
                Some(d) => self.inner.common_divisor(&d, e)?,
            });
        }
        match acc {
            Some(d) => Ok(UnionWeight::singleton(d)),
            None => Ok(UnionWeight::zero()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalSemiring;

    /// Plain numeric ordering on f64 weights; equal weights merge to one.
    #[derive(Debug, Clone)]
    struct NumericOps;

    impl UnionElementOps<f64> for NumericOps {
        fn compare(&self, a: &f64, b: &f64) -> Ordering {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }

        fn merge(&self, a: &f64, _b: &f64) -> Result<f64, FstError> {
            Ok(*a)
        }
    }

    fn ring(restricted: bool) -> UnionSemiring<TropicalSemiring, NumericOps> {
        UnionSemiring::new(TropicalSemiring, NumericOps, restricted)
    }

    #[test]
    fn plus_is_sorted_set_union() {
        let u = ring(false);
        let a = u.weight_from(vec![3.0, 1.0]).unwrap();
        let b = u.weight_from(vec![2.0, 1.0]).unwrap();
        let sum = u.plus(&a, &b).unwrap();
        assert_eq!(sum.elements(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn zero_elements_are_dropped() {
        let u = ring(false);
        let w = u.weight_from(vec![f64::INFINITY, 2.0]).unwrap();
        assert_eq!(w.elements(), &[2.0]);
    }

    #[test]
    fn times_is_pairwise_cross_product() {
        let u = ring(false);
        let a = u.weight_from(vec![1.0, 2.0]).unwrap();
        let b = u.weight_from(vec![10.0, 20.0]).unwrap();
        let prod = u.times(&a, &b).unwrap();
        // 1+10, 1+20, 2+10, 2+20 -> {11, 12, 21, 22}
        assert_eq!(prod.elements(), &[11.0, 12.0, 21.0, 22.0]);
    }

    #[test]
    fn zero_annihilates_times() {
        let u = ring(false);
        let a = u.weight_from(vec![1.0]).unwrap();
        let prod = u.times(&a, &u.zero()).unwrap();
        assert!(u.is_zero(&prod));
    }

    #[test]
    fn restricted_mode_rejects_growth() {
        let u = ring(true);
        let a = u.weight_from(vec![1.0]).unwrap();
        let b = u.weight_from(vec![2.0]).unwrap();
        let err = u.plus(&a, &b).unwrap_err();
        assert!(matches!(err, FstError::NonFunctional(_)));
    }

    #[test]
    fn restricted_mode_allows_merging_equals() {
        let u = ring(true);
        let a = u.weight_from(vec![1.0]).unwrap();
        let sum = u.plus(&a, &a).unwrap();
        assert_eq!(sum.elements(), &[1.0]);
    }

    #[test]
    fn divide_requires_singleton_divisor() {
        let u = ring(false);
        let a = u.weight_from(vec![3.0, 4.0]).unwrap();
        let b = u.weight_from(vec![1.0]).unwrap();
        let q = u.divide(&a, &b).unwrap();
        assert_eq!(q.elements(), &[2.0, 3.0]);

        let bad = u.weight_from(vec![1.0, 2.0]).unwrap();
        assert!(u.divide(&a, &bad).is_err());
    }

    #[test]
    fn one_is_times_identity() {
        let u = ring(false);
        let a = u.weight_from(vec![1.5, 2.5]).unwrap();
        let prod = u.times(&a, &u.one()).unwrap();
        assert!(u.approx_eq(&prod, &a));
    }
}
