//! Stabilization driver: steps a window until it settles or the budget runs out

use super::error::Result;
use super::rules::SandpileRules;
use super::window::LatticeWindow;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Immutable run configuration consumed by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Initial height of the layout rectangle
    pub length: usize,
    /// Initial width of the layout rectangle
    pub width: usize,
    pub max_iterations: u64,
    /// Snapshot cadence; 0 emits only the final window
    pub freq: u64,
}

/// Receives selected windows while the driver runs
pub trait SnapshotSink {
    fn emit(&mut self, iteration: u64, window: &LatticeWindow) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    Running,
    /// No cell is at threshold; stepping further is a no-op
    Stable,
    /// The iteration budget ran out while cells were still toppling
    Exhausted,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Running => write!(f, "running"),
            DriverState::Stable => write!(f, "stable"),
            DriverState::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Final report of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// `Stable` or `Exhausted`
    pub state: DriverState,
    /// Toppling steps applied
    pub iterations: u64,
    pub window: LatticeWindow,
    pub snapshots_emitted: usize,
    pub sink_failures: usize,
}

/// Whether the snapshot for `iteration` should be emitted while stepping.
///
/// With `freq == 0` nothing is emitted during the loop; the final window is
/// emitted once the run ends.
pub fn should_emit(iteration: u64, freq: u64, max_iterations: u64, reached_stable: bool) -> bool {
    if freq == 0 {
        return false;
    }
    iteration % freq == 0 || Some(iteration) == max_iterations.checked_sub(1) || reached_stable
}

/// Drives the sandpile to a fixed point or until the iteration budget is spent
pub struct StabilizationDriver {
    window: LatticeWindow,
    max_iterations: u64,
    freq: u64,
    iteration: u64,
    state: DriverState,
    snapshots_emitted: usize,
    sink_failures: usize,
}

impl StabilizationDriver {
    pub fn new(window: LatticeWindow, max_iterations: u64, freq: u64) -> Self {
        Self {
            window,
            max_iterations,
            freq,
            iteration: 0,
            state: DriverState::Running,
            snapshots_emitted: 0,
            sink_failures: 0,
        }
    }

    /// Load the starting window from layout triples and run parameters
    pub fn from_layout(params: &RunParameters, entries: &[(i64, i64, u64)]) -> Result<Self> {
        let window = LatticeWindow::from_layout(params.width, params.length, entries)?;
        Ok(Self::new(window, params.max_iterations, params.freq))
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Toppling steps applied so far
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn window(&self) -> &LatticeWindow {
        &self.window
    }

    /// Apply one iteration and emit its snapshot if the policy selects it.
    /// Returns the state after the iteration; terminal states are sticky.
    pub fn advance<S: SnapshotSink>(&mut self, sink: &mut S) -> Result<DriverState> {
        if self.state != DriverState::Running {
            return Ok(self.state);
        }
        if self.iteration >= self.max_iterations {
            // Zero budget: nothing may be stepped, so report whether the input is already settled
            self.state = if self.window.is_stable() {
                DriverState::Stable
            } else {
                DriverState::Exhausted
            };
            return Ok(self.state);
        }

        let index = self.iteration;
        let outcome = SandpileRules::topple(&self.window)?;
        if outcome.toppled {
            self.window = outcome.window;
            self.iteration += 1;
            debug!(
                iteration = index,
                bounds = %self.window.bounds(),
                unstable = self.window.unstable_count(),
                "toppled"
            );
        } else {
            self.state = DriverState::Stable;
        }

        let reached_stable = self.state == DriverState::Stable;
        if should_emit(index, self.freq, self.max_iterations, reached_stable) {
            self.hand_off(sink, index);
        }

        if self.state == DriverState::Running && self.iteration >= self.max_iterations {
            self.state = DriverState::Exhausted;
        }
        Ok(self.state)
    }

    /// Run to completion
    pub fn run<S: SnapshotSink>(mut self, sink: &mut S) -> Result<RunOutcome> {
        while self.state == DriverState::Running {
            self.advance(sink)?;
        }

        if self.freq == 0 {
            self.hand_off(sink, self.iteration);
        }

        info!(
            state = %self.state,
            iterations = self.iteration,
            bounds = %self.window.bounds(),
            grains = %self.window.total_grains(),
            snapshots = self.snapshots_emitted,
            "sandpile run finished"
        );

        Ok(RunOutcome {
            state: self.state,
            iterations: self.iteration,
            window: self.window,
            snapshots_emitted: self.snapshots_emitted,
            sink_failures: self.sink_failures,
        })
    }

    fn hand_off<S: SnapshotSink>(&mut self, sink: &mut S, iteration: u64) {
        match sink.emit(iteration, &self.window) {
            Ok(()) => self.snapshots_emitted += 1,
            Err(err) => {
                self.sink_failures += 1;
                warn!(iteration, error = %err, "snapshot sink failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        emitted: Vec<(u64, LatticeWindow)>,
    }

    impl SnapshotSink for Recorder {
        fn emit(&mut self, iteration: u64, window: &LatticeWindow) -> anyhow::Result<()> {
            self.emitted.push((iteration, window.clone()));
            Ok(())
        }
    }

    struct FailingSink;

    impl SnapshotSink for FailingSink {
        fn emit(&mut self, _iteration: u64, _window: &LatticeWindow) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn seed(grains: u64) -> LatticeWindow {
        LatticeWindow::from_layout(1, 1, &[(0, 0, grains)]).unwrap()
    }

    #[test]
    fn test_snapshot_policy() {
        assert!(!should_emit(0, 0, 10, false));
        assert!(!should_emit(3, 0, 10, true));

        assert!(should_emit(0, 3, 10, false));
        assert!(!should_emit(1, 3, 10, false));
        assert!(should_emit(6, 3, 10, false));
        assert!(should_emit(9, 3, 10, false)); // last iteration of the budget
        assert!(should_emit(4, 3, 10, true));
        assert!(!should_emit(4, 3, 0, false));
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut sink = Recorder::default();
        let outcome = StabilizationDriver::new(seed(64), 1, 0).run(&mut sink).unwrap();

        assert_eq!(outcome.state, DriverState::Exhausted);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.window.get(0, 0), 60);
        assert_eq!(sink.emitted.len(), 1);
        assert_eq!(sink.emitted[0].0, 1);
    }

    #[test]
    fn test_reaches_stable() {
        let mut sink = Recorder::default();
        let outcome = StabilizationDriver::new(seed(4), 100, 0).run(&mut sink).unwrap();

        assert_eq!(outcome.state, DriverState::Stable);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.window.is_stable());
        assert_eq!(outcome.window.total_grains(), 4);
        assert_eq!(sink.emitted.len(), 1);
        assert_eq!(sink.emitted[0], (1, outcome.window.clone()));
    }

    #[test]
    fn test_stable_window_is_idempotent() {
        let mut sink = Recorder::default();
        let outcome = StabilizationDriver::new(seed(40), 1_000, 0).run(&mut sink).unwrap();
        assert_eq!(outcome.state, DriverState::Stable);

        let mut window = outcome.window.clone();
        for _ in 0..3 {
            let step = SandpileRules::topple(&window).unwrap();
            assert!(!step.toppled);
            assert_eq!(step.window, outcome.window);
            window = step.window;
        }
    }

    #[test]
    fn test_periodic_snapshots() {
        // 3x3 with center 4 settles after one step, so iteration 1 is the stable one
        let window = LatticeWindow::from_layout(3, 3, &[(1, 1, 4)]).unwrap();
        let mut sink = Recorder::default();
        let outcome = StabilizationDriver::new(window, 10, 5).run(&mut sink).unwrap();

        assert_eq!(outcome.state, DriverState::Stable);
        let indices: Vec<u64> = sink.emitted.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(sink.emitted[1].1, outcome.window);
    }

    #[test]
    fn test_last_budget_iteration_is_emitted() {
        let mut sink = Recorder::default();
        let outcome = StabilizationDriver::new(seed(1_000), 4, 3).run(&mut sink).unwrap();

        assert_eq!(outcome.state, DriverState::Exhausted);
        assert_eq!(outcome.iterations, 4);
        let indices: Vec<u64> = sink.emitted.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 3]);
    }

    #[test]
    fn test_advance_is_sticky_after_termination() {
        let mut sink = Recorder::default();
        let mut driver = StabilizationDriver::new(seed(4), 10, 1);

        assert_eq!(driver.advance(&mut sink).unwrap(), DriverState::Running);
        assert_eq!(driver.advance(&mut sink).unwrap(), DriverState::Stable);
        assert_eq!(driver.iteration(), 1);
        assert_eq!(driver.advance(&mut sink).unwrap(), DriverState::Stable);
        assert_eq!(driver.iteration(), 1);
    }

    #[test]
    fn test_zero_budget() {
        let mut sink = Recorder::default();
        let outcome = StabilizationDriver::new(seed(5), 0, 0).run(&mut sink).unwrap();
        assert_eq!(outcome.state, DriverState::Exhausted);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(sink.emitted.len(), 1);

        let outcome = StabilizationDriver::new(seed(2), 0, 0).run(&mut sink).unwrap();
        assert_eq!(outcome.state, DriverState::Stable);
    }

    #[test]
    fn test_zero_budget_advance_matches_run() {
        let mut sink = Recorder::default();

        let mut settled = StabilizationDriver::new(seed(2), 0, 0);
        assert_eq!(settled.advance(&mut sink).unwrap(), DriverState::Stable);
        assert_eq!(settled.iteration(), 0);
        let ran = StabilizationDriver::new(seed(2), 0, 0).run(&mut sink).unwrap();
        assert_eq!(ran.state, settled.state());

        let mut pending = StabilizationDriver::new(seed(5), 0, 0);
        assert_eq!(pending.advance(&mut sink).unwrap(), DriverState::Exhausted);
        assert_eq!(pending.window().get(0, 0), 5);
        let ran = StabilizationDriver::new(seed(5), 0, 0).run(&mut sink).unwrap();
        assert_eq!(ran.state, pending.state());
    }

    #[test]
    fn test_sink_failures_do_not_stop_the_run() {
        let outcome = StabilizationDriver::new(seed(16), 100, 1)
            .run(&mut FailingSink)
            .unwrap();
        assert_eq!(outcome.state, DriverState::Stable);
        assert_eq!(outcome.snapshots_emitted, 0);
        assert!(outcome.sink_failures > 0);
    }

    #[test]
    fn test_from_layout_rejects_bad_entry() {
        let params = RunParameters { length: 2, width: 2, max_iterations: 5, freq: 0 };
        assert!(StabilizationDriver::from_layout(&params, &[(5, 0, 1)]).is_err());
        assert!(StabilizationDriver::from_layout(&params, &[(1, 1, 9)]).is_ok());
    }
}
