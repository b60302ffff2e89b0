//! Textual presentation of the simulation results.

use crate::scenario::Report;
use routesim_core::packet::TraceReport;
use std::fmt;

/// Renders a [`TraceReport`] over two lines:
///
/// ```text
/// Routing Trace Packet from r0 to r15
/// Routing Trace Stack: r0 -> r3 -> r6 -> r9 -> r12 -> r15, cost: 25
/// ```
pub struct TraceDisplay<'a>(pub &'a TraceReport);

/// Renders the totals of a [`Report`].
pub struct ReportDisplay<'a>(pub &'a Report);

impl fmt::Display for TraceDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "Routing Trace Packet from {} to {}",
            report.source, report.destination
        )?;

        f.write_str("Routing Trace Stack: ")?;
        for (index, router) in report.visited.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{router}")?;
        }
        write!(f, ", cost: {}", report.cost)
    }
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "traces completed: {}", report.traces.len())?;
        writeln!(f, "packets delivered: {}", report.delivered)?;
        write!(f, "packets dropped: {}", report.dropped())?;
        for (reason, count) in &report.drops {
            write!(f, "\n  {reason}: {count}")?;
        }
        Ok(())
    }
}
