//! Scripted runs of a [`Network`].

use crate::render::TraceDisplay;
use anyhow::{Context as _, Result, ensure};
use routesim_core::{
    DropReason, Event,
    network::Network,
    packet::{Packet, TraceReport},
    router::RouterId,
};
use std::{collections::BTreeMap, io::Write};
use tracing::info;

/// the smallest network [`Scenario::demonstration`] can run on
pub const DEMONSTRATION_MIN_ROUTERS: usize = 7;

/// One instruction of a [`Scenario`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// run that many ticks
    Run(u64),
    /// run that many ticks, each router being ticked with the given
    /// probability only
    RunDesynchronized { ticks: u64, tick_probability: f64 },
    /// send a trace packet
    Trace { from: RouterId, to: RouterId },
    /// send `count` data packets of `size`
    Flood {
        from: RouterId,
        to: RouterId,
        count: usize,
        size: u64,
    },
    /// force the failure of a router
    Fail(RouterId),
    /// restore a failed router
    Restore(RouterId),
    /// print a line of text
    Announce(String),
}

/// An ordered list of [`Step`]s, run against a [`Network`].
///
/// ```
/// use routesim::scenario::{Scenario, Step};
/// use routesim_core::{network::Network, router::RouterId};
///
/// let (a, b) = (RouterId::new(0), RouterId::new(1));
/// let mut network: Network<()> = Network::new(2);
/// network.configure_link(a, b).apply().unwrap();
///
/// let scenario = Scenario::new()
///     .then(Step::Run(20))
///     .then(Step::Trace { from: a, to: b })
///     .then(Step::Run(5));
///
/// let mut output = Vec::new();
/// let report = scenario.run(&mut network, &mut output).unwrap();
///
/// assert_eq!(report.traces.len(), 1);
/// assert_eq!(report.traces[0].visited, vec![a, b]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    steps: Vec<Step>,
}

/// What happened while running a [`Scenario`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// every completed trace, in completion order
    pub traces: Vec<TraceReport>,
    /// number of data packets that reached their destination
    pub delivered: usize,
    /// number of dropped packets, by reason
    pub drops: BTreeMap<DropReason, usize>,
}

impl Report {
    /// total number of dropped packets
    pub fn dropped(&self) -> usize {
        self.drops.values().sum()
    }

    fn record<T>(&mut self, event: Event<T>) {
        match event {
            Event::Delivered { .. } => self.delivered += 1,
            Event::TraceCompleted(report) => self.traces.push(report),
            Event::Dropped { reason, .. } => *self.drops.entry(reason).or_default() += 1,
        }
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// append a step
    pub fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The demonstration run, for a network of at least
    /// [`DEMONSTRATION_MIN_ROUTERS`] routers laid out from left (`r0`) to
    /// right (the last router):
    ///
    /// 1. warm up, then desynchronize the broadcasts;
    /// 2. trace a packet across the network;
    /// 3. flood large packets from both sides and trace packets while the
    ///    network is congested, then once it has cleared;
    /// 4. fail `r3`, then `r6`, tracing a packet after each failure.
    ///
    /// # Errors
    ///
    /// Fails if `num_routers` is below [`DEMONSTRATION_MIN_ROUTERS`].
    pub fn demonstration(num_routers: usize) -> Result<Self> {
        ensure!(
            num_routers >= DEMONSTRATION_MIN_ROUTERS,
            "The demonstration needs at least {DEMONSTRATION_MIN_ROUTERS} routers, the network has {num_routers}"
        );

        let last = num_routers.saturating_sub(1);
        let left = [0usize, 1, 2].map(RouterId::from);
        let right = [last, last.saturating_sub(1), last.saturating_sub(2)].map(RouterId::from);
        let (origin, target) = (left[0], right[0]);
        let sink = RouterId::new(4);

        let senders = left
            .iter()
            .chain(right.iter().rev())
            .map(RouterId::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        let mut scenario = Self::new()
            .then(Step::Run(50))
            .then(Step::RunDesynchronized {
                ticks: 50,
                tick_probability: 0.5,
            })
            .then(Step::Trace {
                from: origin,
                to: target,
            })
            .then(Step::Run(50))
            .then(Step::Announce(format!(
                "BEGIN: NETWORK BANDWIDTH TEST; 54 LARGE PACKETS SENT FROM {senders}"
            )));

        for from in left {
            scenario = scenario.then(Step::Flood {
                from,
                to: target,
                count: 9,
                size: 10,
            });
        }
        for from in right {
            scenario = scenario.then(Step::Flood {
                from,
                to: sink,
                count: 9,
                size: 10,
            });
        }

        scenario = scenario
            .then(Step::Run(50))
            .then(Step::Announce(
                "Begin packet traces during high network use".to_owned(),
            ))
            .then(Step::Trace {
                from: origin,
                to: target,
            })
            .then(Step::Trace {
                from: left[2],
                to: target,
            })
            .then(Step::Trace {
                from: right[2],
                to: sink,
            })
            .then(Step::Run(1_000))
            .then(Step::Run(50))
            .then(Step::Announce(
                "Packet trace 50 ticks after network cleared".to_owned(),
            ))
            .then(Step::Trace {
                from: origin,
                to: target,
            })
            .then(Step::Run(100))
            .then(Step::Announce("END: NETWORK BANDWIDTH TEST".to_owned()));

        for failed in [RouterId::new(3), RouterId::new(6)] {
            scenario = scenario
                .then(Step::Fail(failed))
                .then(Step::Announce(format!(
                    "Forcing Router {} to fail. Sending trace packet after 5 network ticks.",
                    failed.into_u64()
                )))
                .then(Step::Run(5))
                .then(Step::Trace {
                    from: origin,
                    to: target,
                })
                .then(Step::Run(50));
        }

        Ok(scenario)
    }

    /// Run every step against `network`, writing announcements and
    /// completed traces to `out` as they happen.
    ///
    /// # Errors
    ///
    /// Fails on the first step naming a router that is not part of the
    /// network, or if `out` cannot be written to.
    pub fn run<T, W>(&self, network: &mut Network<T>, out: &mut W) -> Result<Report>
    where
        W: Write,
    {
        let mut report = Report::default();

        for step in &self.steps {
            let printed = report.traces.len();

            match step {
                Step::Run(ticks) => network.run_with(*ticks, |event| report.record(event)),
                Step::RunDesynchronized {
                    ticks,
                    tick_probability,
                } => {
                    for _ in 0..*ticks {
                        network.tick_desynchronized_with(*tick_probability, |event| {
                            report.record(event)
                        });
                    }
                }
                Step::Trace { from, to } => {
                    let trace = Packet::routing_trace(network.packet_id_generator(), *from, *to);
                    network
                        .send(trace)
                        .with_context(|| format!("Failed to send a trace from {from} to {to}"))?;
                }
                Step::Flood {
                    from,
                    to,
                    count,
                    size,
                } => {
                    for _ in 0..*count {
                        let packet = Packet::builder(network.packet_id_generator())
                            .from(*from)
                            .to(*to)
                            .size(*size)
                            .build()?;
                        network
                            .send(packet)
                            .with_context(|| format!("Failed to send a packet from {from} to {to}"))?;
                    }
                }
                Step::Fail(router) => network.force_router_failure(*router)?,
                Step::Restore(router) => network.force_full_throughput(*router)?,
                Step::Announce(text) => {
                    info!(time = %network.time(), "{text}");
                    writeln!(out, "\n{text}")?;
                }
            }

            for trace in &report.traces[printed..] {
                writeln!(out, "{}", TraceDisplay(trace))?;
            }
        }

        Ok(report)
    }
}
