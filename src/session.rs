use serde::Serialize;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::engine::{GameState, KickDetectionEngine, TickReport};
use crate::pose::Skeleton;

/// What the scorecard receives when a session finishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    pub total_kicks: u32,
    /// Seconds from each ball spawn to the kick that cleared it, in order
    pub kick_times: Vec<f64>,
    /// Whole seconds played
    pub duration: u32,
}

impl SessionResult {
    fn from_state(state: &GameState, duration: u32) -> Self {
        Self {
            total_kicks: state.total_kicks,
            kick_times: state.kick_times.clone(),
            duration,
        }
    }

    /// Mean kick time, 0 when no kick landed.
    pub fn average_kick_time(&self) -> f64 {
        if self.kick_times.is_empty() {
            return 0.0;
        }
        self.kick_times.iter().sum::<f64>() / self.kick_times.len() as f64
    }

    /// Fastest kick time, 0 when no kick landed.
    pub fn best_kick_time(&self) -> f64 {
        self.kick_times
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Population standard deviation of the kick times, 0 for fewer than two kicks.
    pub fn kick_time_spread(&self) -> f64 {
        if self.kick_times.len() < 2 {
            return 0.0;
        }
        let mean = self.average_kick_time();
        let variance = self
            .kick_times
            .iter()
            .map(|t| (t - mean).powi(2))
            .sum::<f64>()
            / self.kick_times.len() as f64;
        variance.sqrt()
    }

    pub fn kicks_per_minute(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        self.total_kicks as f64 * 60.0 / self.duration as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Continue { time_left: u32 },
    /// Emitted once, on the first tick at or past the configured duration
    Ended(SessionResult),
    /// The session is not running (never started, ended or stopped)
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    Ended,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SessionController {
    config: SessionConfig,
    phase: Phase,
    started_at: f64,
    last_tick: f64,
    engine: KickDetectionEngine,
    result: Option<SessionResult>,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: Phase::NotStarted,
            started_at: 0.0,
            last_tick: 0.0,
            engine: KickDetectionEngine::new(&config, 0.0),
            result: None,
        }
    }

    /// Starts (or restarts, for a retry) with fresh game state.
    pub fn start(&mut self, config: SessionConfig, now: f64) {
        info!(
            posture = %config.posture,
            difficulty = %config.difficulty,
            duration = config.duration_secs,
            "session started"
        );
        self.config = config;
        self.phase = Phase::Running;
        self.started_at = now;
        self.last_tick = now;
        self.engine = KickDetectionEngine::new(&config, now);
        self.result = None;
    }

    pub fn restart(&mut self, now: f64) {
        let config = self.config;
        self.start(config, now);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.started_at).max(0.0)
    }

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn engine(&self) -> &KickDetectionEngine {
        &self.engine
    }

    /// Checks the session clock. Detection goes through [`Self::observe`].
    pub fn tick(&mut self, now: f64) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }
        self.last_tick = now;

        let duration = self.config.duration_secs as f64;
        let elapsed = self.elapsed(now);
        if elapsed >= duration {
            self.phase = Phase::Ended;
            let result = SessionResult::from_state(self.engine.state(), self.config.duration_secs);
            info!(
                kicks = result.total_kicks,
                average = result.average_kick_time(),
                "session ended"
            );
            self.result = Some(result.clone());
            return TickOutcome::Ended(result);
        }

        TickOutcome::Continue {
            time_left: (duration - elapsed) as u32,
        }
    }

    /// Feeds one detection (or its absence) to the kick engine.
    pub fn observe(&mut self, detection: Option<&Skeleton>, now: f64) -> Option<TickReport> {
        if !self.is_running() {
            return None;
        }
        let report = self.engine.update(detection, now);
        if report.is_none() {
            debug!(at = now, "no usable detection, kick state frozen");
        }
        report
    }

    /// Halts ticking. Repeated calls, or a call after the session ended, keep
    /// the first result.
    pub fn stop(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let played = self.elapsed(self.last_tick).min(self.config.duration_secs as f64) as u32;
        self.result = Some(SessionResult::from_state(self.engine.state(), played));
        self.phase = Phase::Stopped;
        info!(played, kicks = self.engine.state().total_kicks, "session stopped");
    }

    /// Result of the finished or stopped session, or a live snapshot while running.
    pub fn result(&self) -> SessionResult {
        match &self.result {
            Some(result) => result.clone(),
            None => {
                let played = self.elapsed(self.last_tick) as u32;
                SessionResult::from_state(self.engine.state(), played)
            }
        }
    }
}
