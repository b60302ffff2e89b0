/// the simulation clock
///
/// A [`Tick`] is one unit of the single global clock of the
/// [`Network`]. Every router is given the current tick when it is
/// asked to advance, and the bootstrap window as well as the periodic
/// throttle decay are expressed in ticks.
///
/// [`Network`]: crate::network::Network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(C)]
pub struct Tick(u64);

impl Tick {
    pub const ZERO: Self = Tick(0);

    /// create a [`Tick`] at the given point in time.
    ///
    /// ```
    /// # use routesim_core::network::Tick;
    /// let tick = Tick::new(10);
    /// assert_eq!(tick.into_u64(), 10);
    /// ```
    pub const fn new(tick: u64) -> Self {
        Self(tick)
    }

    /// get the next tick.
    ///
    /// # Example
    ///
    /// ```
    /// # use routesim_core::network::Tick;
    /// # let prev = Tick::ZERO;
    /// let next = prev.next();
    /// # assert_ne!(prev, next);
    /// assert!(prev < next);
    /// ```
    ///
    /// # Wrap-around
    ///
    /// After `u64::MAX` advances the counter wraps to [`Tick::ZERO`],
    /// which would re-open the bootstrap broadcast window. It is not
    /// reachable in practice.
    #[inline(always)]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[inline(always)]
    pub fn into_u64(self) -> u64 {
        self.0
    }

    /// `true` if this tick falls on the given cadence.
    ///
    /// A cadence of `0` never matches.
    ///
    /// ```
    /// # use routesim_core::network::Tick;
    /// assert!(Tick::new(20).is_multiple_of(10));
    /// assert!(!Tick::new(21).is_multiple_of(10));
    /// assert!(!Tick::new(20).is_multiple_of(0));
    /// ```
    #[inline]
    pub fn is_multiple_of(self, cadence: u64) -> bool {
        cadence != 0 && self.0 % cadence == 0
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
