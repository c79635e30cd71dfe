//! Callbacks invoked by the driver once per sweep and once at termination.

use crate::solving::SolveSummary;
use crate::table::ValueTable;

/// Progress of one completed sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepReport {
    /// One-based count of completed sweeps.
    pub iteration: usize,
    /// Maximum absolute change of the unrelaxed update during this sweep.
    pub max_diff: f64,
}

/// Receives solver progress. Both hooks default to doing nothing.
pub trait SweepObserver {
    fn on_sweep(&mut self, _report: &SweepReport) {}

    /// Called once when the solve stops without diverging.
    fn on_finish(&mut self, _summary: &SolveSummary, _table: &ValueTable) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SweepObserver for NoopObserver {}

/// Reports progress through the `log` facade.
///
/// Each sweep is logged at `info`; at termination the value table is logged
/// for every `day_stride`-th day, one line per day, skipping the failure level.
#[derive(Clone, Copy, Debug)]
pub struct LoggingObserver {
    day_stride: usize,
}

impl LoggingObserver {
    pub fn new(day_stride: usize) -> Self {
        Self {
            day_stride: day_stride.max(1),
        }
    }

    /// Renders the value row of `day`, failure level excluded.
    pub fn format_day(table: &ValueTable, day: usize) -> String {
        let row = table.day(day);
        let visible = &row[..row.len() - 1];
        let cells: Vec<String> = visible.iter().map(|value| format!("{value:12.6}")).collect();
        format!("{day:>6} {}", cells.join(" "))
    }
}

impl SweepObserver for LoggingObserver {
    fn on_sweep(&mut self, report: &SweepReport) {
        log::info!(
            "sweep {} finished, max change {:e}",
            report.iteration,
            report.max_diff
        );
    }

    fn on_finish(&mut self, summary: &SolveSummary, table: &ValueTable) {
        log::info!(
            "{:?} after {} sweeps (max change {:e})",
            summary.outcome,
            summary.iterations,
            summary.max_diff
        );
        let space = table.state_space();
        for day in (0..=space.max_days()).step_by(self.day_stride) {
            log::info!("{}", Self::format_day(table, day));
        }
    }
}
