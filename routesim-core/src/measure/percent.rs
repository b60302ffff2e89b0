use std::fmt;

/// A multiplicative degradation factor in `(0.0, 1.0]`.
///
/// Connections carry two of them, the throughput percent (forced
/// failures) and the throttle percent (congestion backpressure). `1.0`
/// means no degradation. `0.0` is excluded so that the cost of a
/// connection (inversely proportional to the product of both factors)
/// stays finite.
///
/// ```
/// # use routesim_core::measure::Percent;
/// let half = Percent::new(0.5).unwrap();
/// assert_eq!(half.to_string(), "50%");
/// assert_eq!(half.compound(half).value(), 0.25);
///
/// assert!(Percent::new(0.0).is_err());
/// assert!(Percent::new(1.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(f64);

/// Error returned when constructing a [`Percent`] outside `(0.0, 1.0]`.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("percent must be in (0.0, 1.0], got {0}")]
pub struct PercentError(f64);

impl Percent {
    /// no degradation
    pub const FULL: Self = Self(1.0);

    /// Create a validated percent.
    ///
    /// # Errors
    ///
    /// Returns [`PercentError`] if `value` is NaN, not strictly positive
    /// or greater than `1.0`.
    pub fn new(value: f64) -> Result<Self, PercentError> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(PercentError(value))
        }
    }

    /// constructor for constants, checked at compile time
    pub(crate) const fn checked(value: f64) -> Self {
        assert!(value > 0.0 && value <= 1.0, "percent must be in (0.0, 1.0]");
        Self(value)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_full(self) -> bool {
        self.0 >= 1.0
    }

    /// apply `factor` on top of this percent (`self * factor`).
    ///
    /// The product of two values in `(0, 1]` is in `[0, 1]`; an underflow
    /// to `0` is clamped to the smallest positive value.
    #[must_use = "function does not modify the current value"]
    pub fn compound(self, factor: Percent) -> Self {
        Self((self.0 * factor.0).max(f64::MIN_POSITIVE))
    }

    /// one exponential recovery step toward [`Percent::FULL`].
    ///
    /// Once the value has reached `snap_threshold` it snaps to exactly
    /// `1.0`, otherwise it moves by `rate` of the remaining distance.
    /// `rate` is clamped to `[0.0, 1.0]` (NaN counts as `0.0`) so the
    /// result stays in `(0.0, 1.0]` and never decreases.
    ///
    /// ```
    /// # use routesim_core::measure::Percent;
    /// let p = Percent::new(0.5).unwrap();
    /// assert_eq!(p.recover(0.2, 0.95).value(), 0.6);
    ///
    /// let p = Percent::new(0.96).unwrap();
    /// assert_eq!(p.recover(0.2, 0.95), Percent::FULL);
    /// ```
    #[must_use = "function does not modify the current value"]
    pub fn recover(self, rate: f64, snap_threshold: f64) -> Self {
        if self.0 >= snap_threshold {
            return Self::FULL;
        }
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self((self.0 + (1.0 - self.0) * rate).min(1.0))
    }
}

impl Default for Percent {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = self.0 * 100.0;
        if pct.fract() == 0.0 {
            write!(f, "{}%", pct as u64)
        } else {
            write!(f, "{:.2}%", pct)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(Percent::new(0.0).is_err());
        assert!(Percent::new(-0.5).is_err());
        assert!(Percent::new(1.000_001).is_err());
        assert!(Percent::new(f64::NAN).is_err());
        assert!(Percent::new(f64::INFINITY).is_err());
    }

    #[test]
    fn accepts_bounds() {
        assert_eq!(Percent::new(1.0).unwrap(), Percent::FULL);
        assert!(Percent::new(f64::MIN_POSITIVE).is_ok());
    }

    #[test]
    fn compound_never_reaches_zero() {
        let mut p = Percent::FULL;
        let half = Percent::new(0.5).unwrap();
        for _ in 0..2_000 {
            p = p.compound(half);
        }
        assert!(p.value() > 0.0);
    }

    #[test]
    fn recover_is_monotonic_and_bounded() {
        let mut p = Percent::new(0.01).unwrap();
        let mut steps = 0;
        while !p.is_full() {
            let next = p.recover(0.2, 0.95);
            assert!(next > p, "{next} should be above {p}");
            assert!(next.value() <= 1.0);
            if p.value() >= 0.95 {
                assert_eq!(next, Percent::FULL);
            }
            p = next;
            steps += 1;
            assert!(steps < 100, "recovery did not converge");
        }
    }

    #[test]
    fn recover_with_out_of_range_rate() {
        let p = Percent::new(0.5).unwrap();

        assert_eq!(p.recover(-2.0, 0.95), p);
        assert_eq!(p.recover(f64::NAN, 0.95), p);
        assert_eq!(p.recover(3.0, 0.95), Percent::FULL);
    }

    #[test]
    fn recover_full_stays_full() {
        assert_eq!(Percent::FULL.recover(0.2, 0.95), Percent::FULL);
    }

    #[test]
    fn error_display() {
        let err = Percent::new(2.0).unwrap_err();
        assert_eq!(err.to_string(), "percent must be in (0.0, 1.0], got 2");
    }
}
