//! Value types for the quantities the routers reason about.

mod cost;
mod failure_rate;
mod percent;

pub use self::{
    cost::Cost,
    failure_rate::{FailureRate, FailureRateError, FailureRateParseError},
    percent::{Percent, PercentError},
};
