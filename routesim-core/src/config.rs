use crate::{
    defaults::{
        DEFAULT_BROADCAST_INTERVAL, DEFAULT_CONGESTION_THROTTLE_FACTOR,
        DEFAULT_FAILURE_THROUGHPUT_PERCENT, DEFAULT_INITIAL_BROADCAST_INTERVAL,
        DEFAULT_INITIALIZATION_TICKS, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_THROTTLE_DECAY_INTERVAL,
        DEFAULT_THROTTLE_DECAY_RATE, DEFAULT_THROTTLE_SNAP_THRESHOLD,
    },
    measure::{Percent, PercentError},
    network::Tick,
};
use thiserror::Error;

/// The tunables of a simulation.
///
/// A [`SimConfiguration`] is handed to the [`Network`] when it is
/// created and shared, read-only, with every router. Two networks with
/// different configurations can run side by side.
///
/// # Example
///
/// ```
/// use routesim_core::SimConfiguration;
///
/// let configuration = SimConfiguration {
///     broadcast_interval: 5,
///     ..SimConfiguration::default()
/// };
/// # assert_eq!(configuration.initialization_ticks, 10);
/// ```
///
/// [`Network`]: crate::network::Network
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfiguration {
    /// steady-state broadcast threshold, in ticks since the last broadcast
    pub broadcast_interval: u64,
    /// broadcast threshold while the clock is within `initialization_ticks`
    pub initial_broadcast_interval: u64,
    /// length of the bootstrap window
    pub initialization_ticks: u64,
    /// fraction of the remaining distance recovered by a decay step
    pub throttle_decay_rate: f64,
    /// decay steps run on ticks that are a multiple of this value
    pub throttle_decay_interval: u64,
    /// throttle percent from which a decay step snaps back to `1.0`
    pub throttle_snap_threshold: f64,
    /// factor carried by the throttle packets sent on queue overflow
    pub congestion_throttle_factor: Percent,
    /// throughput percent of the connections of a failed router
    pub failure_throughput_percent: Percent,
    /// queue capacity of routers that were not given one explicitly
    pub default_max_queue_size: u64,
}

/// A [`SimConfiguration`] value that would break the `(0, 1]` range of
/// the connection percents.
#[derive(Debug, Clone, Copy, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Percent(#[from] PercentError),

    #[error("throttle decay rate must be in [0.0, 1.0], got {rate}")]
    DecayRate { rate: f64 },

    #[error("throttle snap threshold must be in (0.0, 1.0], got {threshold}")]
    SnapThreshold { threshold: f64 },
}

impl SimConfiguration {
    /// Build a configuration from the raw factors, validating them.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::Percent`] if one of the factors is not in
    /// `(0.0, 1.0]`.
    pub fn with_factors(
        congestion_throttle_factor: f64,
        failure_throughput_percent: f64,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            congestion_throttle_factor: Percent::new(congestion_throttle_factor)?,
            failure_throughput_percent: Percent::new(failure_throughput_percent)?,
            ..Self::default()
        })
    }

    /// Check the raw decay tunables, to be called once the public
    /// fields have been set.
    ///
    /// ```
    /// # use routesim_core::SimConfiguration;
    /// let configuration = SimConfiguration {
    ///     throttle_decay_rate: -2.0,
    ///     ..SimConfiguration::default()
    /// };
    /// assert!(configuration.validate().is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DecayRate`] if `throttle_decay_rate` is not
    /// in `[0.0, 1.0]`, [`ConfigurationError::SnapThreshold`] if
    /// `throttle_snap_threshold` is not in `(0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let rate = self.throttle_decay_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigurationError::DecayRate { rate });
        }
        let threshold = self.throttle_snap_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigurationError::SnapThreshold { threshold });
        }
        Ok(())
    }

    /// The broadcast threshold that applies at `now`.
    ///
    /// ```
    /// # use routesim_core::{SimConfiguration, network::Tick};
    /// let configuration = SimConfiguration::default();
    ///
    /// assert_eq!(configuration.broadcast_threshold(Tick::new(10)), 1);
    /// assert_eq!(configuration.broadcast_threshold(Tick::new(11)), 10);
    /// ```
    pub fn broadcast_threshold(&self, now: Tick) -> u64 {
        if now.into_u64() <= self.initialization_ticks {
            self.initial_broadcast_interval
        } else {
            self.broadcast_interval
        }
    }
}

impl Default for SimConfiguration {
    fn default() -> Self {
        Self {
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
            initial_broadcast_interval: DEFAULT_INITIAL_BROADCAST_INTERVAL,
            initialization_ticks: DEFAULT_INITIALIZATION_TICKS,
            throttle_decay_rate: DEFAULT_THROTTLE_DECAY_RATE,
            throttle_decay_interval: DEFAULT_THROTTLE_DECAY_INTERVAL,
            throttle_snap_threshold: DEFAULT_THROTTLE_SNAP_THRESHOLD,
            congestion_throttle_factor: DEFAULT_CONGESTION_THROTTLE_FACTOR,
            failure_throughput_percent: DEFAULT_FAILURE_THROUGHPUT_PERCENT,
            default_max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
        }
    }
}
