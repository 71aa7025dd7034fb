//! Trace replay against the mock backend.

use crate::trace::{Action, Step};
use anyhow::{Context, Result, ensure};
use edgeio_attrs::Board;
use edgeio_core::{BoardConfig, LineId, Timestamp};
use edgeio_hardware::mock::{MockClock, MockGpio, MockScheduler};
use edgeio_hardware::Clock;
use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Every line a configuration refers to.
pub fn configured_lines(config: &BoardConfig) -> BTreeSet<LineId> {
    let inputs = config.inputs.iter().map(|i| i.line);
    let readers = config.wiegand.iter().flat_map(|r| [r.d0, r.d1]);
    let ports = config.ttl_ports.iter().map(|p| p.line);
    inputs.chain(readers).chain(ports).collect()
}

/// A board running on mock hardware, driven step by step.
pub struct Replay {
    gpio: MockGpio,
    clock: MockClock,
    scheduler: MockScheduler,
    board: Board,
    ready: Vec<(String, watch::Receiver<u64>)>,
}

impl Replay {
    /// Build the board with every configured line idle high.
    pub fn new(config: &BoardConfig) -> Result<Self> {
        let gpio = MockGpio::with_lines(configured_lines(config));
        let clock = MockClock::new();
        let scheduler = MockScheduler::new(clock.clone());
        let board = Board::new(
            config,
            Arc::new(gpio.clone()),
            Arc::new(scheduler.clone()),
            Arc::new(clock.clone()),
        )
        .context("assembling board")?;

        let ready = board
            .readers()
            .iter()
            .map(|r| (r.name().to_string(), r.subscribe()))
            .collect();

        Ok(Self {
            gpio,
            clock,
            scheduler,
            board,
            ready,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn report_ready(&mut self, out: &mut impl Write) -> Result<()> {
        let now = self.clock.now();
        for (reader, rx) in &mut self.ready {
            if rx.has_changed().unwrap_or(false) {
                let generation = *rx.borrow_and_update();
                info!(reader = %reader, generation, at = %now, "Frame ready");
                writeln!(out, "[{now}] {reader}: frame ready")?;
            }
        }
        Ok(())
    }

    /// Advance to `at_us`, stopping at every timer deadline on the way.
    fn advance_to(&mut self, at_us: u64, out: &mut impl Write) -> Result<()> {
        let now = self.clock.now().as_micros();
        ensure!(at_us >= now, "step at {at_us}us is before the current time {now}us");

        while let Some(deadline) = self.scheduler.next_deadline()
            && deadline.as_micros() <= at_us
        {
            let fired = self.scheduler.run_until(deadline);
            debug!(fired, at = %deadline, "Timers fired");
            self.report_ready(out)?;
        }
        self.scheduler.run_until(Timestamp::from_micros(at_us));
        Ok(())
    }

    /// Apply one step, writing any result to `out`.
    pub fn step(&mut self, step: &Step, out: &mut impl Write) -> Result<()> {
        self.advance_to(step.at_us, out)?;
        let at = step.at_us;

        match &step.action {
            Action::Edge { line, level } => {
                self.gpio
                    .set_level(*line, *level, Timestamp::from_micros(at))
                    .with_context(|| format!("driving {line}"))?;
            }
            Action::Store { path, value } => match self.board.store(path, value) {
                Ok(()) => writeln!(out, "[{at}] {path} <- {}", value.trim_end())?,
                Err(e) => writeln!(out, "[{at}] {path}: error: {e}")?,
            },
            Action::Show(path) => match self.board.show(path) {
                Ok(value) => writeln!(out, "[{at}] {path}: {}", value.trim_end())?,
                Err(e) => writeln!(out, "[{at}] {path}: error: {e}")?,
            },
        }
        Ok(())
    }

    /// Let every pending timer expire.
    pub fn finish(&mut self, out: &mut impl Write) -> Result<()> {
        while let Some(deadline) = self.scheduler.next_deadline() {
            self.advance_to(deadline.as_micros(), out)?;
        }
        Ok(())
    }

    /// Replay a whole trace.
    pub fn run(&mut self, steps: &[Step], out: &mut impl Write) -> Result<()> {
        for step in steps {
            self.step(step, out)?;
        }
        self.finish(out)
    }
}
