//! Per-tick kick detection.
//!
//! The engine follows the knee of the active side only. A kick fires once that
//! knee has stayed inside the hit zone for the hold time, after which the knee
//! must leave the zone before another dwell can count. Ticks without a usable
//! skeleton leave every timer untouched.

use tracing::{debug, info};

use crate::ball::{compute_target, Side};
use crate::config::{EngineTuning, SessionConfig};
use crate::geometry::{distance, Point};
use crate::pose::{LowerBody, Skeleton};

/// How long after a kick the ball keeps glowing, in seconds.
pub const GLOW_WINDOW: f64 = 0.3;

/// Hit-zone state of the active side's knee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneState {
    Outside,
    Dwelling { since: f64 },
    /// A kick just fired; the knee must exit the zone to re-arm.
    Debounce,
}

/// Mutable game state for one session. Times are seconds on the session clock.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub active_side: Side,
    pub zone: ZoneState,
    pub last_kick_time: Option<f64>,
    pub ball_spawn_time: f64,
    pub last_hit_time: Option<f64>,
    pub total_kicks: u32,
    pub kick_times: Vec<f64>,
}

impl GameState {
    pub fn new(started_at: f64) -> Self {
        Self {
            active_side: Side::Left,
            zone: ZoneState::Outside,
            last_kick_time: None,
            ball_spawn_time: started_at,
            last_hit_time: None,
            total_kicks: 0,
            kick_times: Vec::new(),
        }
    }

    pub fn is_glowing(&self, now: f64) -> bool {
        self.last_hit_time
            .is_some_and(|hit| now - hit < GLOW_WINDOW)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KickEvent {
    pub side: Side,
    /// Seconds from ball spawn to the kick
    pub kick_time: f64,
    pub total_kicks: u32,
    pub at: f64,
}

/// Everything one detected tick produced: geometry for the renderer and the
/// kick, if one fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub target: Point,
    pub left_knee: Point,
    pub right_knee: Point,
    /// Side whose knee was hit-tested this tick
    pub tracked_side: Side,
    pub inside: bool,
    pub glow: bool,
    pub kick: Option<KickEvent>,
}

#[derive(Debug, Clone)]
pub struct KickDetectionEngine {
    tuning: EngineTuning,
    difficulty_offset: f64,
    posture_scale: f64,
    state: GameState,
}

impl KickDetectionEngine {
    pub fn new(config: &SessionConfig, started_at: f64) -> Self {
        Self {
            tuning: config.tuning,
            difficulty_offset: config.difficulty.offset(),
            posture_scale: config.posture.scale(),
            state: GameState::new(started_at),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    pub fn target_for(&self, hip_center: Point) -> Point {
        compute_target(
            hip_center,
            self.state.active_side,
            self.difficulty_offset,
            self.posture_scale,
        )
    }

    /// Advances the state machine by one tick. A missing or short skeleton
    /// freezes the machine and yields `None`.
    pub fn update(&mut self, detection: Option<&Skeleton>, now: f64) -> Option<TickReport> {
        let body = detection.and_then(Skeleton::lower_body)?;
        Some(self.update_body(&body, now))
    }

    pub fn update_body(&mut self, body: &LowerBody, now: f64) -> TickReport {
        let tracked_side = self.state.active_side;
        let target = self.target_for(body.hip_center);
        let knee = match tracked_side {
            Side::Left => body.left_knee,
            Side::Right => body.right_knee,
        };
        let inside = distance(knee, target) <= self.tuning.hit_radius;

        let kick = if inside {
            self.on_inside(now)
        } else {
            self.state.zone = ZoneState::Outside;
            None
        };

        TickReport {
            target,
            left_knee: body.left_knee,
            right_knee: body.right_knee,
            tracked_side,
            inside,
            glow: self.state.is_glowing(now),
            kick,
        }
    }

    fn on_inside(&mut self, now: f64) -> Option<KickEvent> {
        match self.state.zone {
            ZoneState::Outside => {
                debug!(side = %self.state.active_side, at = now, "dwell started");
                self.state.zone = ZoneState::Dwelling { since: now };
                None
            }
            ZoneState::Debounce => None,
            ZoneState::Dwelling { since } => {
                let held = now - since >= self.tuning.hold_time;
                let cooled = self
                    .state
                    .last_kick_time
                    .map_or(true, |last| now - last >= self.tuning.min_kick_interval);
                if held && cooled {
                    Some(self.fire(now))
                } else {
                    None
                }
            }
        }
    }

    fn fire(&mut self, now: f64) -> KickEvent {
        let state = &mut self.state;
        let side = state.active_side;
        let kick_time = now - state.ball_spawn_time;

        state.kick_times.push(kick_time);
        state.total_kicks += 1;
        state.last_hit_time = Some(now);
        state.last_kick_time = Some(now);
        state.ball_spawn_time = now;
        state.zone = ZoneState::Debounce;
        state.active_side = side.opposite();

        info!(%side, kick_time, total = state.total_kicks, "kick");

        KickEvent {
            side,
            kick_time,
            total_kicks: state.total_kicks,
            at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, Posture};

    const HIPS: (Point, Point) = (Point { x: 480.0, y: 400.0 }, Point { x: 520.0, y: 400.0 });
    // Resting knees well outside both ball positions
    const REST_LEFT: Point = Point { x: 470.0, y: 520.0 };
    const REST_RIGHT: Point = Point { x: 530.0, y: 520.0 };

    fn engine() -> KickDetectionEngine {
        let cfg = SessionConfig::new(Posture::Standing, Difficulty::Easy, 30);
        KickDetectionEngine::new(&cfg, 0.0)
    }

    fn skeleton(left: Point, right: Point) -> Skeleton {
        Skeleton::from_lower_body(HIPS, (left, right))
    }

    fn left_kick() -> Skeleton {
        skeleton(Point::new(415.0, 398.0), REST_RIGHT)
    }

    fn right_kick() -> Skeleton {
        skeleton(REST_LEFT, Point::new(582.0, 401.0))
    }

    fn rest() -> Skeleton {
        skeleton(REST_LEFT, REST_RIGHT)
    }

    #[test]
    fn test_entry_tick_starts_dwell_without_kick() {
        let mut e = engine();
        let report = e.update(Some(&left_kick()), 1.0).unwrap();

        assert_eq!(report.target, Point::new(420.0, 400.0));
        assert!(report.inside);
        assert!(report.kick.is_none());
        assert_eq!(e.state().zone, ZoneState::Dwelling { since: 1.0 });
    }

    #[test]
    fn test_dwell_just_short_of_hold_time() {
        let mut e = engine();
        e.update(Some(&left_kick()), 0.0);
        let report = e.update(Some(&left_kick()), 0.49).unwrap();

        assert!(report.kick.is_none());
        assert_eq!(e.state().total_kicks, 0);
    }

    #[test]
    fn test_dwell_at_hold_time_fires() {
        let mut e = engine();
        e.update(Some(&left_kick()), 0.0);
        let report = e.update(Some(&left_kick()), 0.5).unwrap();

        let kick = report.kick.expect("kick should fire at the hold time");
        assert_eq!(kick.side, Side::Left);
        assert_eq!(kick.total_kicks, 1);
        assert_eq!(kick.kick_time, 0.5);
    }

    #[test]
    fn test_kick_side_effects() {
        let mut e = engine();
        e.update(Some(&left_kick()), 1.0);
        e.update(Some(&left_kick()), 1.25);
        let report = e.update(Some(&left_kick()), 1.75).unwrap();
        assert!(report.kick.is_some());

        let s = e.state();
        assert_eq!(s.total_kicks, 1);
        assert_eq!(s.kick_times, vec![1.75]);
        assert_eq!(s.active_side, Side::Right);
        assert_eq!(s.zone, ZoneState::Debounce);
        assert_eq!(s.last_kick_time, Some(1.75));
        assert_eq!(s.last_hit_time, Some(1.75));
        assert_eq!(s.ball_spawn_time, 1.75);
        assert!(report.glow);
    }

    #[test]
    fn test_leaving_zone_resets_dwell() {
        let mut e = engine();
        e.update(Some(&left_kick()), 0.0);
        e.update(Some(&rest()), 0.25);
        assert_eq!(e.state().zone, ZoneState::Outside);

        e.update(Some(&left_kick()), 0.5);
        let report = e.update(Some(&left_kick()), 0.75).unwrap();
        assert!(report.kick.is_none(), "dwell restarted at 0.5");
        assert!(e.update(Some(&left_kick()), 1.0).unwrap().kick.is_some());
    }

    #[test]
    fn test_side_alternates_and_old_side_no_longer_counts() {
        let mut e = engine();
        e.update(Some(&left_kick()), 0.0);
        assert!(e.update(Some(&left_kick()), 0.5).unwrap().kick.is_some());

        // Holding the left knee where the left ball used to be does nothing now
        for i in 1..=10 {
            let report = e.update(Some(&left_kick()), 0.5 + i as f64 * 0.1).unwrap();
            assert_eq!(report.tracked_side, Side::Right);
            assert!(!report.inside);
            assert!(report.kick.is_none());
        }
        assert_eq!(e.state().total_kicks, 1);

        e.update(Some(&right_kick()), 2.0);
        let kick = e.update(Some(&right_kick()), 2.5).unwrap().kick.unwrap();
        assert_eq!(kick.side, Side::Right);
        assert_eq!(e.state().active_side, Side::Left);
    }

    #[test]
    fn test_debounce_requires_exit_before_next_kick() {
        // A player standing with the right knee already in the right zone
        let both_in = skeleton(Point::new(415.0, 398.0), Point::new(582.0, 401.0));
        let mut e = engine();
        e.update(Some(&both_in), 0.0);
        assert!(e.update(Some(&both_in), 0.5).unwrap().kick.is_some());

        for i in 1..=20 {
            let report = e.update(Some(&both_in), 0.5 + i as f64 * 0.1).unwrap();
            assert!(report.inside);
            assert!(report.kick.is_none(), "debounce must hold until exit");
        }
        assert_eq!(e.state().zone, ZoneState::Debounce);

        e.update(Some(&rest()), 2.6);
        e.update(Some(&both_in), 2.7);
        assert!(e.update(Some(&both_in), 3.2).unwrap().kick.is_some());
        assert_eq!(e.state().total_kicks, 2);
    }

    #[test]
    fn test_cooldown_blocks_fast_second_kick() {
        let cfg = SessionConfig::new(Posture::Standing, Difficulty::Easy, 30).with_tuning(
            EngineTuning {
                hold_time: 0.125,
                ..EngineTuning::default()
            },
        );
        let mut e = KickDetectionEngine::new(&cfg, 0.0);
        e.update(Some(&left_kick()), 0.0);
        assert!(e.update(Some(&left_kick()), 0.125).unwrap().kick.is_some());

        e.update(Some(&rest()), 0.1875);
        e.update(Some(&right_kick()), 0.25);
        // held long enough but only 0.25s since the last kick
        assert!(e.update(Some(&right_kick()), 0.375).unwrap().kick.is_none());
        assert!(e.update(Some(&right_kick()), 0.5).unwrap().kick.is_some());
    }

    #[test]
    fn test_missing_detection_freezes_state() {
        let mut e = engine();
        e.update(Some(&left_kick()), 0.0);
        let before = e.state().clone();

        assert!(e.update(None, 0.1).is_none());
        let short = Skeleton::new(left_kick().keypoints[..14].to_vec());
        assert!(e.update(Some(&short), 0.2).is_none());

        assert_eq!(e.state(), &before);
    }

    #[test]
    fn test_knee_labels_rederived_each_tick() {
        let mut e = engine();
        let swapped = Skeleton::from_lower_body(HIPS, (REST_RIGHT, Point::new(415.0, 398.0)));
        e.update(Some(&left_kick()), 0.0);
        let report = e.update(Some(&swapped), 0.5).unwrap();
        assert_eq!(report.left_knee, Point::new(415.0, 398.0));
        assert!(report.kick.is_some());
    }

    #[test]
    fn test_glow_window() {
        let mut s = GameState::new(0.0);
        assert!(!s.is_glowing(0.0));
        s.last_hit_time = Some(2.0);
        assert!(s.is_glowing(2.25));
        assert!(!s.is_glowing(2.5));
    }

    #[test]
    fn test_sitting_hard_target() {
        let cfg = SessionConfig::new(Posture::Sitting, Difficulty::Hard, 30);
        let e = KickDetectionEngine::new(&cfg, 0.0);
        assert_eq!(e.target_for(Point::new(500.0, 400.0)), Point::new(452.0, 370.0));
    }
}
