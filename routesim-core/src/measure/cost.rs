use std::{cmp::Ordering, fmt, ops::Add};

/// The routing metric of a path.
///
/// The cost of a single [`Connection`] is the inverse of its effective
/// throughput (`100 / throughput`), and the cost of a path is the sum of
/// the costs of its hops. Lower is better.
///
/// A destination with no known path has an [`infinite`] cost.
///
/// ```
/// # use routesim_core::measure::Cost;
/// let hop = Cost::new(10.0);
/// assert_eq!((hop + hop).to_string(), "20");
/// assert!(hop < Cost::INFINITE);
/// assert_eq!(Cost::INFINITE.to_string(), "inf");
/// ```
///
/// [`Connection`]: crate::connection::Connection
/// [`infinite`]: Cost::INFINITE
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cost(f64);

impl Cost {
    /// The cost of reaching oneself.
    pub const ZERO: Self = Self(0.0);

    /// The cost of an unreachable destination.
    pub const INFINITE: Self = Self(f64::INFINITY);

    #[inline]
    pub const fn new(cost: f64) -> Self {
        Self(cost)
    }

    /// cost of a link with the given effective throughput.
    ///
    /// ```
    /// # use routesim_core::measure::Cost;
    /// assert_eq!(Cost::from_throughput(10.0), Cost::new(10.0));
    /// assert_eq!(Cost::from_throughput(5.0), Cost::new(20.0));
    /// ```
    #[inline]
    pub fn from_throughput(throughput: f64) -> Self {
        Self(100.0 / throughput)
    }

    #[inline]
    pub fn into_f64(self) -> f64 {
        self.0
    }

    /// `false` for the cost of an unreachable destination.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// shift this cost by `delta`, as when the cost of the first hop
    /// of a path changes.
    #[must_use = "function does not modify the current value"]
    #[inline]
    pub fn adjust(self, delta: f64) -> Self {
        Self(self.0 + delta)
    }

    /// the difference `self - previous`
    #[inline]
    pub fn delta(self, previous: Self) -> f64 {
        self.0 - previous.0
    }
}

impl Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl fmt::Display for Cost {
    /// whole costs print without decimals, others with 2.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.0.is_finite() {
            write!(f, "inf")
        } else if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{:.2}", self.0)
        }
    }
}
