use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::fdm::{FdmError, FlightDynamics};
use super::clock::{Clock, WallClock};
use super::command::Command;

/// Snapshot published while the loop runs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStatus {
    pub sim_time: f64,
    pub wall_time: f64,
    pub frames: u64,
    pub holding: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The engine reported the end of its script
    ScriptFinished,
    /// Sim time passed the configured end
    EndTimeReached,
    Quit,
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ScriptFinished => write!(f, "script finished"),
            StopReason::EndTimeReached => write!(f, "end time reached"),
            StopReason::Quit => write!(f, "quit requested"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fdm(#[from] FdmError),

    #[error("{name} of {value} seconds is not a valid duration")]
    InvalidPeriod { name: &'static str, value: f64 },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub frames: u64,
    pub sim_time: f64,
    pub wall_time: f64,
    pub paused_time: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} frames: sim {:.2}s, wall {:.2}s, paused {:.2}s ({} -> {})",
            self.stop_reason,
            self.frames,
            self.sim_time,
            self.wall_time,
            self.paused_time,
            self.started_at.format("%H:%M:%S"),
            self.finished_at.format("%H:%M:%S"),
        )
    }
}

/// Drives an FDM against wall-clock time.
///
/// In real time the loop runs however many frames the simulation lags behind the
/// wall clock. Time spent holding is added to the start time so a resume does not
/// trigger a burst of catch-up frames.
pub struct RealtimeRunner<F, C = WallClock> {
    fdm: F,
    clock: C,
    config: RunConfig,
    commands: Option<Receiver<Command>>,
    shutdown: Option<Arc<AtomicBool>>,
    status: Option<watch::Sender<RunStatus>>,
    frames: u64,
}

impl<F: FlightDynamics> RealtimeRunner<F, WallClock> {
    pub fn new(fdm: F, config: RunConfig) -> Self {
        Self::with_clock(fdm, WallClock::new(), config)
    }
}

impl<F: FlightDynamics, C: Clock> RealtimeRunner<F, C> {
    pub fn with_clock(fdm: F, clock: C, config: RunConfig) -> Self {
        Self {
            fdm,
            clock,
            config,
            commands: None,
            shutdown: None,
            status: None,
            frames: 0,
        }
    }

    pub fn with_commands(mut self, commands: Receiver<Command>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn with_status(mut self, status: watch::Sender<RunStatus>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn fdm(&self) -> &F {
        &self.fdm
    }

    pub fn into_fdm(self) -> F {
        self.fdm
    }

    fn step(&mut self) -> Result<bool, FdmError> {
        self.frames += 1;
        self.fdm.run()
    }

    /// Apply pending operator commands. Returns true on quit.
    fn drain_commands(&mut self) -> bool {
        let Some(ref commands) = self.commands else {
            return false;
        };

        loop {
            match commands.try_recv() {
                Ok(command) => {
                    info!("[RUNNER] Command: {}", command);
                    match command {
                        Command::Pause => self.fdm.hold(),
                        Command::Resume => self.fdm.resume(),
                        Command::Step(n) => self.fdm.enable_increment_then_hold(n),
                        Command::Quit => return true,
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    debug!("[RUNNER] Command channel closed");
                    self.commands = None;
                    return false;
                }
            }
        }
    }

    fn stop_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn publish(&self, start: Duration) {
        if let Some(ref status) = self.status {
            status.send_replace(RunStatus {
                sim_time: self.fdm.sim_time(),
                wall_time: self.clock.now().saturating_sub(start).as_secs_f64(),
                frames: self.frames,
                holding: self.fdm.holding(),
            });
        }
    }

    /// Run until the script ends, sim time passes `end`, or a stop is requested
    pub fn run(&mut self) -> Result<RunReport, RunError> {
        let started_at = Utc::now();
        let frame_duration = self.fdm.delta_t();
        let nice_period = if self.config.nice {
            let secs = self.config.nice_period(frame_duration).max(0.0);
            let period = Duration::try_from_secs_f64(secs).map_err(|_| RunError::InvalidPeriod {
                name: "nice sleep period",
                value: secs,
            })?;
            Some(period)
        } else {
            None
        };
        let mut suspend = self.config.suspend;

        info!(
            "[RUNNER] Starting: frame {:.6}s, realtime {}, nice {}, end {:.1}s",
            frame_duration, self.config.realtime, self.config.nice, self.config.end
        );

        let start = self.clock.now();
        let mut initial = start;
        let mut current = start;
        let mut paused = Duration::ZERO;
        let mut paused_total = Duration::ZERO;

        let mut result = self.step()?;

        if suspend {
            info!("[RUNNER] Starting suspended");
            self.fdm.hold();
        }

        let mut was_holding = self.fdm.holding();

        let stop_reason = loop {
            if !result {
                break StopReason::ScriptFinished;
            }
            if self.fdm.sim_time() > self.config.end {
                break StopReason::EndTimeReached;
            }
            if self.stop_requested() {
                break StopReason::Interrupted;
            }
            if self.drain_commands() {
                break StopReason::Quit;
            }

            self.fdm.check_incremental_hold();

            let holding = self.fdm.holding();
            if holding != was_holding {
                if holding {
                    info!("[RUNNER] Paused at {:.2}s", self.fdm.sim_time());
                } else {
                    info!("[RUNNER] Resumed at {:.2}s", self.fdm.sim_time());
                }
                was_holding = holding;
            }

            if holding {
                suspend = true;
                paused = self.clock.now().saturating_sub(current);
                result = self.step()?;
            } else if self.config.realtime {
                if suspend {
                    initial += paused;
                    paused_total += paused;
                    paused = Duration::ZERO;
                    suspend = false;
                }

                current = self.clock.now();
                let actual_elapsed = current.saturating_sub(initial).as_secs_f64();
                let lag = actual_elapsed - self.fdm.sim_time();

                let behind = if frame_duration > 0.0 && lag > 0.0 {
                    (lag / frame_duration).floor() as u64
                } else {
                    0
                };

                for _ in 0..behind {
                    result = self.step()?;
                    current = self.clock.now();
                    if self.fdm.holding() || !result {
                        break;
                    }
                }
            } else {
                result = self.step()?;
            }

            if let Some(period) = nice_period {
                self.clock.sleep(period);
            }

            self.publish(start);
        };

        if stop_reason == StopReason::Interrupted {
            warn!("[RUNNER] Interrupted at {:.2}s", self.fdm.sim_time());
        }

        let report = RunReport {
            frames: self.frames,
            sim_time: self.fdm.sim_time(),
            wall_time: self.clock.now().saturating_sub(start).as_secs_f64(),
            paused_time: paused_total.as_secs_f64(),
            started_at,
            finished_at: Utc::now(),
            stop_reason,
        };
        info!("[RUNNER] Stopped: {}", report);

        Ok(report)
    }
}
