// Semiring contract and the three primitive rings over f64.
//
// Semirings are plain value structs passed explicitly wherever an algorithm
// needs one; there are no global singletons. The composite rings live in
// `gallic` and `union_weight`.

use crate::error::FstError;

/// Default tolerance for approximate weight equality.
pub const DEFAULT_APPROX_DELTA: f64 = 1e-5;

/// Algebraic contract over a weight type.
///
/// Laws (exercised by the unit tests): `plus` and `times` are closed and
/// associative, `plus` is commutative, `zero` is the `plus` identity and
/// annihilates under `times`, `one` is the `times` identity, and `times`
/// left-distributes over `plus`. `divide`, `reverse` and `common_divisor`
/// are partial: rings that do not define them return
/// [`FstError::UnsupportedOperation`].
///
/// The fallible signatures exist for the composite rings: a Gallic plus in
/// restrict mode or a restricted union times can legitimately fail, and
/// callers must see that instead of a silently wrong weight.
pub trait Semiring: Clone + std::fmt::Debug {
    type Weight: Clone + PartialEq + std::fmt::Debug;

    fn plus(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError>;
    fn times(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError>;
    fn divide(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, FstError>;
    fn zero(&self) -> Self::Weight;
    fn one(&self) -> Self::Weight;

    /// True if the value lies in the ring's domain.
    fn is_member(&self, a: &Self::Weight) -> bool;

    /// Approximate equality, absorbing floating-point drift.
    fn approx_eq(&self, a: &Self::Weight, b: &Self::Weight) -> bool;

    fn is_zero(&self, a: &Self::Weight) -> bool {
        self.approx_eq(a, &self.zero())
    }

    fn is_one(&self, a: &Self::Weight) -> bool {
        self.approx_eq(a, &self.one())
    }

    /// The natural order: `a < b` iff `a != b` and `a + b == a`.
    fn natural_less(&self, a: &Self::Weight, b: &Self::Weight) -> Result<bool, FstError> {
        Ok(!self.approx_eq(a, b) && self.approx_eq(&self.plus(a, b)?, a))
    }

    /// Weight of the reversed path. Identity for the primitive rings.
    fn reverse(&self, a: &Self::Weight) -> Result<Self::Weight, FstError> {
        let _ = a;
        Err(FstError::UnsupportedOperation("reverse"))
    }

    /// A weight dividing both operands, used to factor shared prefixes
    /// during determinization. Undefined by default.
    fn common_divisor(
        &self,
        a: &Self::Weight,
        b: &Self::Weight,
    ) -> Result<Self::Weight, FstError> {
        let _ = (a, b);
        Err(FstError::UnsupportedOperation("common_divisor"))
    }
}

/// Tag identifying one of the primitive f64 rings, used by the binary
/// model header and the CLI `--semiring` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemiringKind {
    Tropical,
    Log,
    Probability,
}

impl SemiringKind {
    pub fn name(self) -> &'static str {
        match self {
            SemiringKind::Tropical => "tropical",
            SemiringKind::Log => "log",
            SemiringKind::Probability => "probability",
        }
    }
}

/// Marker for the primitive rings whose weight is a bare f64.
pub trait StdSemiring: Semiring<Weight = f64> + Default {
    const KIND: SemiringKind;
}

fn f64_approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < DEFAULT_APPROX_DELTA || (a == f64::INFINITY && b == f64::INFINITY)
}

/// Min-plus ring: `plus = min`, `times = +`, `zero = +inf`, `one = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TropicalSemiring;

impl Semiring for TropicalSemiring {
    type Weight = f64;

    fn plus(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        Ok(a.min(*b))
    }

    fn times(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        Ok(a + b)
    }

    fn divide(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        if *b == f64::INFINITY {
            return Err(FstError::DivideByZero);
        }
        if *a == f64::INFINITY {
            return Ok(f64::INFINITY);
        }
        Ok(a - b)
    }

    fn zero(&self) -> f64 {
        f64::INFINITY
    }

    fn one(&self) -> f64 {
        0.0
    }

    fn is_member(&self, a: &f64) -> bool {
        !a.is_nan()
    }

    fn approx_eq(&self, a: &f64, b: &f64) -> bool {
        f64_approx_eq(*a, *b)
    }

    fn reverse(&self, a: &f64) -> Result<f64, FstError> {
        Ok(*a)
    }
}

impl StdSemiring for TropicalSemiring {
    const KIND: SemiringKind = SemiringKind::Tropical;
}

/// Log ring: `plus = -log(exp(-a) + exp(-b))`, `times = +`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSemiring;

impl Semiring for LogSemiring {
    type Weight = f64;

    fn plus(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        // Stable log-sum-exp on negated logs.
        if *a == f64::INFINITY {
            return Ok(*b);
        }
        if *b == f64::INFINITY {
            return Ok(*a);
        }
        let (lo, hi) = if a < b { (*a, *b) } else { (*b, *a) };
        Ok(lo - (-(hi - lo)).exp().ln_1p())
    }

    fn times(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        Ok(a + b)
    }

    fn divide(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        if *b == f64::INFINITY {
            return Err(FstError::DivideByZero);
        }
        if *a == f64::INFINITY {
            return Ok(f64::INFINITY);
        }
        Ok(a - b)
    }

    fn zero(&self) -> f64 {
        f64::INFINITY
    }

    fn one(&self) -> f64 {
        0.0
    }

    fn is_member(&self, a: &f64) -> bool {
        !a.is_nan()
    }

    fn approx_eq(&self, a: &f64, b: &f64) -> bool {
        f64_approx_eq(*a, *b)
    }

    fn reverse(&self, a: &f64) -> Result<f64, FstError> {
        Ok(*a)
    }
}

impl StdSemiring for LogSemiring {
    const KIND: SemiringKind = SemiringKind::Log;
}

/// Probability ring: `plus = +`, `times = *`, `zero = 0`, `one = 1`.
/// `divide` is not defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbabilitySemiring;

impl Semiring for ProbabilitySemiring {
    type Weight = f64;

    fn plus(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        Ok(a + b)
    }

    fn times(&self, a: &f64, b: &f64) -> Result<f64, FstError> {
        Ok(a * b)
    }

    fn divide(&self, _a: &f64, _b: &f64) -> Result<f64, FstError> {
        Err(FstError::UnsupportedOperation("divide"))
    }

    fn zero(&self) -> f64 {
        0.0
    }

    fn one(&self) -> f64 {
        1.0
    }

    fn is_member(&self, a: &f64) -> bool {
        !a.is_nan() && *a >= 0.0
    }

    fn approx_eq(&self, a: &f64, b: &f64) -> bool {
        f64_approx_eq(*a, *b)
    }

    fn reverse(&self, a: &f64) -> Result<f64, FstError> {
        Ok(*a)
    }
}

impl StdSemiring for ProbabilitySemiring {
    const KIND: SemiringKind = SemiringKind::Probability;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<f64> {
        vec![0.0, 0.5, 1.0, 2.5, 7.0, f64::INFINITY]
    }

    fn prob_samples() -> Vec<f64> {
        vec![0.0, 0.1, 0.5, 1.0, 2.0]
    }

    fn check_laws<S: Semiring<Weight = f64>>(ring: &S, samples: &[f64]) {
        let zero = ring.zero();
        let one = ring.one();
        for &a in samples {
            // Identities.
            assert!(ring.approx_eq(&ring.plus(&a, &zero).unwrap(), &a), "{a}");
            assert!(ring.approx_eq(&ring.times(&a, &one).unwrap(), &a), "{a}");
            assert!(ring.approx_eq(&ring.times(&one, &a).unwrap(), &a), "{a}");
            // Zero annihilates.
            assert!(ring.is_zero(&ring.times(&a, &zero).unwrap()), "{a}");
            assert!(ring.is_zero(&ring.times(&zero, &a).unwrap()), "{a}");
            for &b in samples {
                // Commutativity of plus.
                let ab = ring.plus(&a, &b).unwrap();
                let ba = ring.plus(&b, &a).unwrap();
                assert!(ring.approx_eq(&ab, &ba), "{a} {b}");
                for &c in samples {
                    // Associativity.
                    let p1 = ring.plus(&ring.plus(&a, &b).unwrap(), &c).unwrap();
                    let p2 = ring.plus(&a, &ring.plus(&b, &c).unwrap()).unwrap();
                    assert!(ring.approx_eq(&p1, &p2), "{a} {b} {c}");
                    let t1 = ring.times(&ring.times(&a, &b).unwrap(), &c).unwrap();
                    let t2 = ring.times(&a, &ring.times(&b, &c).unwrap()).unwrap();
                    assert!(ring.approx_eq(&t1, &t2), "{a} {b} {c}");
                    // Left distributivity.
                    let d1 = ring.times(&a, &ring.plus(&b, &c).unwrap()).unwrap();
                    let d2 = ring
                        .plus(
                            &ring.times(&a, &b).unwrap(),
                            &ring.times(&a, &c).unwrap(),
                        )
                        .unwrap();
                    assert!(ring.approx_eq(&d1, &d2), "{a} {b} {c}");
                }
            }
        }
    }

    #[test]
    fn tropical_laws() {
        check_laws(&TropicalSemiring, &samples());
    }

    #[test]
    fn log_laws() {
        check_laws(&LogSemiring, &samples());
    }

    #[test]
    fn probability_laws() {
        check_laws(&ProbabilitySemiring, &prob_samples());
    }

    #[test]
    fn tropical_divide_inverts_times() {
        let ring = TropicalSemiring;
        for &a in &[0.0, 1.5, 3.0] {
            for &b in &[0.0, 0.5, 2.0] {
                let ab = ring.times(&a, &b).unwrap();
                let back = ring.divide(&ab, &a).unwrap();
                assert!(ring.approx_eq(&back, &b));
            }
        }
    }

    #[test]
    fn divide_by_zero_fails() {
        let ring = TropicalSemiring;
        let err = ring.divide(&1.0, &ring.zero()).unwrap_err();
        assert!(matches!(err, FstError::DivideByZero));
    }

    #[test]
    fn probability_divide_is_unsupported() {
        let err = ProbabilitySemiring.divide(&0.5, &0.5).unwrap_err();
        assert!(matches!(err, FstError::UnsupportedOperation("divide")));
    }

    #[test]
    fn log_plus_matches_reference() {
        let ring = LogSemiring;
        // -ln(e^-1 + e^-2)
        let expected = -((-1.0f64).exp() + (-2.0f64).exp()).ln();
        let got = ring.plus(&1.0, &2.0).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn natural_order_tropical() {
        let ring = TropicalSemiring;
        assert!(ring.natural_less(&1.0, &2.0).unwrap());
        assert!(!ring.natural_less(&2.0, &1.0).unwrap());
        assert!(!ring.natural_less(&1.0, &1.0).unwrap());
    }

    #[test]
    fn nan_is_not_a_member() {
        assert!(!TropicalSemiring.is_member(&f64::NAN));
        assert!(TropicalSemiring.is_member(&f64::INFINITY));
        assert!(!ProbabilitySemiring.is_member(&-1.0));
    }
}
