use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ball::{compute_target, Side};
use crate::capture::Frame;
use crate::config::SessionConfig;
use crate::geometry::Point;
use crate::pose::{PoseEstimator, Skeleton};

/// Parameters of the synthetic player's kick rhythm, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rhythm {
    pub raise: f64,
    pub hold: f64,
    pub lower: f64,
    pub rest: f64,
}

impl Rhythm {
    pub fn cycle(&self) -> f64 {
        self.raise + self.hold + self.lower + self.rest
    }
}

impl Default for Rhythm {
    fn default() -> Self {
        Self {
            raise: 0.25,
            hold: 0.7,
            lower: 0.25,
            rest: 0.3,
        }
    }
}

/// Demo-mode estimator: a player standing mid-frame who kicks left, then
/// right, in a steady rhythm. Keypoints get a little jitter and the detector
/// occasionally loses the player for a frame.
#[derive(Debug)]
pub struct SimulatedPlayer {
    config: SessionConfig,
    rhythm: Rhythm,
    frame_period: f64,
    jitter: f64,
    dropout_rate: f64,
    rng: StdRng,
}

impl SimulatedPlayer {
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        Self {
            config,
            rhythm: Rhythm::default(),
            frame_period: crate::runtime::TICK_RATE_MS as f64 / 1000.0,
            jitter: 4.0,
            dropout_rate: 0.03,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_rhythm(mut self, rhythm: Rhythm) -> Self {
        self.rhythm = rhythm;
        self
    }

    /// Turns off noise and dropouts.
    pub fn steady(mut self) -> Self {
        self.jitter = 0.0;
        self.dropout_rate = 0.0;
        self
    }

    pub fn with_frame_period(mut self, secs: f64) -> Self {
        self.frame_period = secs;
        self
    }

    fn hips(width: u32, height: u32) -> (Point, Point) {
        let cx = width as f64 / 2.0;
        let cy = height as f64 * 11.0 / 20.0;
        (Point::new(cx - 20.0, cy), Point::new(cx + 20.0, cy))
    }

    /// Noise-free knee positions at time `t`.
    pub fn knees_at(&self, t: f64, width: u32, height: u32) -> (Point, Point) {
        let (lh, rh) = Self::hips(width, height);
        let hip_center = Point::new((lh.x + rh.x) / 2.0, lh.y);
        let rest_left = Point::new(lh.x - 10.0, lh.y + 120.0);
        let rest_right = Point::new(rh.x + 10.0, rh.y + 120.0);

        let r = self.rhythm;
        let cycle = r.cycle();
        let kick_no = (t / cycle).floor() as u64;
        let phase = t - kick_no as f64 * cycle;
        let side = if kick_no % 2 == 0 { Side::Left } else { Side::Right };

        let lift = if phase < r.raise {
            phase / r.raise
        } else if phase < r.raise + r.hold {
            1.0
        } else if phase < r.raise + r.hold + r.lower {
            1.0 - (phase - r.raise - r.hold) / r.lower
        } else {
            0.0
        };

        let target = compute_target(
            hip_center,
            side,
            self.config.difficulty.offset(),
            self.config.posture.scale(),
        );
        let lerp = |a: Point, b: Point| Point::new(a.x + (b.x - a.x) * lift, a.y + (b.y - a.y) * lift);

        match side {
            Side::Left => (lerp(rest_left, target), rest_right),
            Side::Right => (rest_left, lerp(rest_right, target)),
        }
    }

    fn shake(&mut self, p: Point) -> Point {
        if self.jitter == 0.0 {
            return p;
        }
        let j = self.jitter;
        Point::new(
            p.x + self.rng.gen_range(-j..=j),
            p.y + self.rng.gen_range(-j..=j),
        )
    }
}

impl PoseEstimator for SimulatedPlayer {
    fn infer(&mut self, frame: &Frame) -> Vec<Skeleton> {
        if self.dropout_rate > 0.0 && self.rng.gen_bool(self.dropout_rate) {
            return Vec::new();
        }
        let t = frame.seq as f64 * self.frame_period;
        let (lh, rh) = Self::hips(frame.width, frame.height);
        let (lk, rk) = self.knees_at(t, frame.width, frame.height);
        let hips = (self.shake(lh), self.shake(rh));
        let knees = (self.shake(lk), self.shake(rk));

        // Detector order for the knee pair is not guaranteed
        let knees = if frame.seq % 2 == 0 { knees } else { (knees.1, knees.0) };
        vec![Skeleton::from_lower_body(hips, knees)]
    }

    fn name(&self) -> &str {
        "simulated player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, Posture};
    use crate::engine::KickDetectionEngine;

    fn config() -> SessionConfig {
        SessionConfig::new(Posture::Standing, Difficulty::Medium, 30)
    }

    #[test]
    fn test_knee_reaches_ball_during_hold() {
        let p = SimulatedPlayer::new(config(), 1).steady();
        let (left, _) = p.knees_at(0.5, 640, 480);
        // hips centred at (320, 264); medium lifts the ball 15px
        assert_eq!(left, Point::new(240.0, 249.0));

        let (_, right) = p.knees_at(1.5 + 0.5, 640, 480);
        assert_eq!(right, Point::new(400.0, 249.0));
    }

    #[test]
    fn test_knees_rest_between_kicks() {
        let p = SimulatedPlayer::new(config(), 1).steady();
        let (l, r) = p.knees_at(1.3, 640, 480);
        assert_eq!(l, Point::new(290.0, 384.0));
        assert_eq!(r, Point::new(350.0, 384.0));
    }

    #[test]
    fn test_steady_player_kicks_every_cycle() {
        let mut player = SimulatedPlayer::new(config(), 7)
            .steady()
            .with_frame_period(0.02);
        let mut engine = KickDetectionEngine::new(&config(), 0.0);

        for seq in 0..500u64 {
            let frame = Frame::blank(seq, 640, 480);
            let skeletons = player.infer(&frame);
            engine.update(skeletons.first(), seq as f64 * 0.02);
        }
        // 10 seconds of play, one kick landing 0.7s into each 1.5s cycle
        assert_eq!(engine.state().total_kicks, 7);
    }

    #[test]
    fn test_noisy_player_is_deterministic_per_seed() {
        let run = |seed| {
            let mut player = SimulatedPlayer::new(config(), seed);
            (0..50u64)
                .map(|seq| player.infer(&Frame::blank(seq, 640, 480)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }
}
