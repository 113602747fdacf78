use serde::{Deserialize, Serialize};

use crate::capture::Frame;
use crate::geometry::{disambiguate_left_right, midpoint, Point};

/// COCO-17 indices consumed by the game. The estimator does not guarantee
/// which knee of the pair is the left one.
pub const LEFT_HIP: usize = 11;
pub const RIGHT_HIP: usize = 12;
pub const KNEE_A: usize = 13;
pub const KNEE_B: usize = 14;

/// Skeletons shorter than this are treated as "no detection".
pub const MIN_KEYPOINTS: usize = 15;

/// A keypoint as `[x, y, confidence]`. Serialises as a 3-element array so that
/// recordings stay compact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, f64)", into = "(f64, f64, f64)")]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<(f64, f64, f64)> for Keypoint {
    fn from(v: (f64, f64, f64)) -> Self {
        Keypoint::new(v.0, v.1, v.2)
    }
}

impl From<Keypoint> for (f64, f64, f64) {
    fn from(k: Keypoint) -> Self {
        (k.x, k.y, k.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skeleton {
    pub keypoints: Vec<Keypoint>,
}

/// Hip center and knees of a usable skeleton, knees already ordered by x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowerBody {
    pub hip_center: Point,
    pub left_knee: Point,
    pub right_knee: Point,
}

impl Skeleton {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn is_usable(&self) -> bool {
        self.keypoints.len() >= MIN_KEYPOINTS
    }

    /// Extracts the keypoints the game consumes, or `None` for a short skeleton.
    pub fn lower_body(&self) -> Option<LowerBody> {
        if !self.is_usable() {
            return None;
        }
        let kp = |i: usize| self.keypoints[i].point();
        let (left_knee, right_knee) = disambiguate_left_right(kp(KNEE_A), kp(KNEE_B));

        Some(LowerBody {
            hip_center: midpoint(kp(LEFT_HIP), kp(RIGHT_HIP)),
            left_knee,
            right_knee,
        })
    }

    /// Builds a full-length skeleton with only hips and knees filled in.
    /// Remaining keypoints sit at the hip center with zero confidence.
    pub fn from_lower_body(hips: (Point, Point), knees: (Point, Point)) -> Self {
        let center = midpoint(hips.0, hips.1);
        let mut keypoints = vec![Keypoint::new(center.x, center.y, 0.0); 17];
        keypoints[LEFT_HIP] = Keypoint::new(hips.0.x, hips.0.y, 1.0);
        keypoints[RIGHT_HIP] = Keypoint::new(hips.1.x, hips.1.y, 1.0);
        keypoints[KNEE_A] = Keypoint::new(knees.0.x, knees.0.y, 1.0);
        keypoints[KNEE_B] = Keypoint::new(knees.1.x, knees.1.y, 1.0);
        Self { keypoints }
    }
}

/// Pose model boundary. Returns every skeleton found in the frame; an empty
/// list means no usable detection.
pub trait PoseEstimator {
    fn infer(&mut self, frame: &Frame) -> Vec<Skeleton>;

    fn name(&self) -> &str {
        "pose estimator"
    }
}

impl<P: PoseEstimator + ?Sized> PoseEstimator for Box<P> {
    fn infer(&mut self, frame: &Frame) -> Vec<Skeleton> {
        (**self).infer(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// The skeleton the game follows: the first one, if it is usable.
pub fn primary_skeleton(skeletons: &[Skeleton]) -> Option<&Skeleton> {
    skeletons.first().filter(|s| s.is_usable())
}
