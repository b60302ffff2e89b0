use rand_core::Rng;
use std::{fmt, str::FromStr};

/// Probability that a single transmission over a [`Connection`] fails.
///
/// The rate is carried by every connection and can be sampled with
/// [`FailureRate::sample_success`], but the router's tick does not
/// consult it: transmissions always succeed once scheduled.
///
/// # Example
///
/// ```
/// use routesim_core::measure::FailureRate;
///
/// // No failures
/// let none = FailureRate::NONE;
/// assert_eq!(none.to_string(), "0%");
///
/// // 5% failures (programmatic)
/// let lossy = FailureRate::new(0.05).unwrap();
/// assert_eq!(lossy.to_string(), "5%");
///
/// // 5% failures (parsed)
/// let parsed: FailureRate = "5%".parse().unwrap();
/// assert_eq!(parsed, lossy);
/// ```
///
/// [`Connection`]: crate::connection::Connection
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct FailureRate(f64);

impl FailureRate {
    /// never fails (default).
    pub const NONE: Self = Self(0.0);

    /// Create a validated failure rate.
    ///
    /// # Errors
    ///
    /// Returns an error if `rate` is not in `[0.0, 1.0]` (including NaN).
    pub fn new(rate: f64) -> Result<Self, FailureRateError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(FailureRateError(rate));
        }
        Ok(Self(rate))
    }

    /// Returns the inner `f64` value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Returns `true` if a transmission succeeds, i.e. with
    /// probability `1 - rate`.
    ///
    /// The caller provides `rng` so that all simulation randomness is
    /// controlled from a single, seedable source in [`Network`]. Any type
    /// implementing [`Rng`] is accepted.
    ///
    /// [`Network`]: crate::network::Network
    pub fn sample_success<R: Rng>(&self, rng: &mut R) -> bool {
        if self.0 == 0.0 {
            return true;
        }
        let bits = rng.next_u64();
        let sample = (bits as f64) * (1.0 / (u64::MAX as f64 + 1.0));
        sample >= self.0
    }
}

impl fmt::Display for FailureRate {
    /// Formats as a percentage with up to 2 decimal places.
    ///
    /// - `0.0` → `"0%"`
    /// - `0.05` → `"5%"`
    /// - `0.123` → `"12.30%"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = self.0 * 100.0;
        if pct.fract() == 0.0 {
            write!(f, "{}%", pct as u64)
        } else {
            write!(f, "{:.2}%", pct)
        }
    }
}

impl FromStr for FailureRate {
    type Err = FailureRateParseError;

    /// Parses a percentage string like `"0%"`, `"5%"`, `"12.30%"`, `"100%"`.
    ///
    /// The `%` suffix is required.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(num) = s.strip_suffix('%') else {
            return Err(FailureRateParseError::MissingSuffix);
        };
        let pct: f64 = num
            .trim()
            .parse()
            .map_err(|_| FailureRateParseError::InvalidNumber)?;
        FailureRate::new(pct / 100.0).map_err(FailureRateParseError::OutOfRange)
    }
}

/// Error returned when constructing a [`FailureRate`] with a value
/// outside `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("failure rate must be in [0.0, 1.0], got {0}")]
pub struct FailureRateError(f64);

/// Error returned when parsing a [`FailureRate`] from a string.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FailureRateParseError {
    /// The string does not end with `%`.
    #[error("expected '%' suffix")]
    MissingSuffix,
    /// The numeric part could not be parsed as a float.
    #[error("invalid number before '%'")]
    InvalidNumber,
    /// The parsed percentage is outside `[0, 100]`.
    #[error("{0}")]
    OutOfRange(#[from] FailureRateError),
}
