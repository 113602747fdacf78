use tracing::debug;

use crate::audio::CueSink;
use crate::capture::FrameSource;
use crate::engine::{KickEvent, TickReport};
use crate::error::Result;
use crate::pose::{primary_skeleton, PoseEstimator};
use crate::render::{annotate, Hud, Renderer};
use crate::session::{SessionController, SessionResult, TickOutcome};

/// Per-tick conditions the loop recovers from locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TickIssue {
    /// Capture had nothing this tick; kick state untouched
    NoFrameAvailable,
    /// No usable skeleton; kick state frozen for this tick
    NoDetection,
    /// Ball would be drawn outside the frame; only the draw is skipped
    RenderTargetInvalid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopStep {
    Played {
        time_left: u32,
        report: Option<TickReport>,
        issue: Option<TickIssue>,
    },
    Skipped {
        time_left: u32,
        issue: TickIssue,
    },
    Ended(SessionResult),
    Idle,
}

impl LoopStep {
    pub fn kick(&self) -> Option<KickEvent> {
        match self {
            LoopStep::Played {
                report: Some(report),
                ..
            } => report.kick,
            _ => None,
        }
    }
}

/// One synchronous game tick: clock check, capture, inference, detection,
/// cue, annotation and render.
pub struct GameLoop<C, P, A, R> {
    pub session: SessionController,
    capture: C,
    estimator: P,
    cue: A,
    renderer: R,
    mirror: bool,
}

impl<C, P, A, R> GameLoop<C, P, A, R>
where
    C: FrameSource,
    P: PoseEstimator,
    A: CueSink,
    R: Renderer,
{
    pub fn new(
        session: SessionController,
        capture: C,
        estimator: P,
        cue: A,
        renderer: R,
        mirror: bool,
    ) -> Self {
        Self {
            session,
            capture,
            estimator,
            cue,
            renderer,
            mirror,
        }
    }

    /// Swaps in fresh capture and inference sources, e.g. to rewind a replay
    /// before a retry.
    pub fn replace_sources(&mut self, capture: C, estimator: P) {
        self.capture = capture;
        self.estimator = estimator;
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn cue(&self) -> &A {
        &self.cue
    }

    pub fn tick(&mut self, now: f64) -> Result<LoopStep> {
        let time_left = match self.session.tick(now) {
            TickOutcome::Continue { time_left } => time_left,
            TickOutcome::Ended(result) => return Ok(LoopStep::Ended(result)),
            TickOutcome::Idle => return Ok(LoopStep::Idle),
        };

        let Some(mut frame) = self.capture.read_frame() else {
            debug!(source = self.capture.name(), "no frame available");
            return Ok(LoopStep::Skipped {
                time_left,
                issue: TickIssue::NoFrameAvailable,
            });
        };
        if self.mirror {
            frame.flip_horizontal();
        }

        let skeletons = self.estimator.infer(&frame);
        let report = self.session.observe(primary_skeleton(&skeletons), now);
        let mut issue = report.is_none().then_some(TickIssue::NoDetection);

        if report.as_ref().is_some_and(|r| r.kick.is_some()) {
            self.cue.play_cue();
        }

        let annotation = annotate(frame, report.as_ref());
        if annotation.ball_skipped {
            debug!("ball outside frame, draw skipped");
            issue = Some(TickIssue::RenderTargetInvalid);
        }

        let hud = Hud {
            time_left,
            kicks: self.session.state().total_kicks,
        };
        self.renderer.render(&annotation.frame, &hud)?;

        Ok(LoopStep::Played {
            time_left,
            report,
            issue,
        })
    }

    /// Ends the session early. Safe to call repeatedly.
    pub fn stop(&mut self) -> SessionResult {
        self.session.stop();
        self.session.result()
    }
}
