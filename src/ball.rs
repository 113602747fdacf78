use crate::geometry::Point;

/// Horizontal distance from the hip center to the ball for a standing player.
pub const BASE_OFFSET: f64 = 80.0;
/// Visual radius of the ball; the hit radius defaults to the same value.
pub const BALL_RADIUS: f64 = 35.0;
/// Extra radius of the halo drawn behind a ball that was just hit.
pub const GLOW_HALO: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Side {
    #[strum(serialize = "LEFT")]
    Left,
    #[strum(serialize = "RIGHT")]
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Where the ball sits for the side that must kick next.
pub fn compute_target(
    hip_center: Point,
    active_side: Side,
    difficulty_offset: f64,
    posture_scale: f64,
) -> Point {
    let offset = BASE_OFFSET * posture_scale;
    let x = match active_side {
        Side::Left => hip_center.x - offset,
        Side::Right => hip_center.x + offset,
    };
    Point::new(x, hip_center.y - difficulty_offset)
}

/// Side length of the square sprite, which grows 20% while glowing.
pub fn sprite_size(glow: bool) -> f64 {
    BALL_RADIUS * (2.0 + if glow { 0.2 } else { 0.0 })
}

/// True when the ball sprite centred on `center` lies fully inside the frame.
/// Hit testing never depends on this.
pub fn sprite_fits(center: Point, glow: bool, width: u32, height: u32) -> bool {
    let size = sprite_size(glow).trunc() as i64;
    let x1 = center.x.trunc() as i64 - size / 2;
    let y1 = center.y.trunc() as i64 - size / 2;

    x1 >= 0 && y1 >= 0 && x1 + size <= width as i64 && y1 + size <= height as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite(), Side::Left);
        assert_eq!(Side::Left.to_string(), "LEFT");
    }

    #[test]
    fn test_target_left_standing_easy() {
        let t = compute_target(Point::new(500.0, 400.0), Side::Left, 0.0, 1.0);
        assert_eq!(t, Point::new(420.0, 400.0));
    }

    #[test]
    fn test_target_right_sitting_hard() {
        let t = compute_target(Point::new(500.0, 400.0), Side::Right, 30.0, 0.6);
        assert_eq!(t, Point::new(548.0, 370.0));
    }

    #[test]
    fn test_target_medium_raises_ball() {
        let t = compute_target(Point::new(300.0, 250.0), Side::Left, 15.0, 1.0);
        assert_eq!(t, Point::new(220.0, 235.0));
    }

    #[test]
    fn test_sprite_size() {
        assert_eq!(sprite_size(false), 70.0);
        assert!((sprite_size(true) - 77.0).abs() < 1e-9);
    }

    #[test]
    fn test_sprite_fits_inside_frame() {
        assert!(sprite_fits(Point::new(320.0, 240.0), false, 640, 480));
        assert!(sprite_fits(Point::new(35.0, 35.0), false, 640, 480));
        assert!(sprite_fits(Point::new(605.0, 445.0), false, 640, 480));
    }

    #[test]
    fn test_sprite_outside_frame() {
        assert!(!sprite_fits(Point::new(34.0, 240.0), false, 640, 480));
        assert!(!sprite_fits(Point::new(320.0, 446.0), false, 640, 480));
        // the larger glowing sprite no longer fits where the plain one does
        assert!(!sprite_fits(Point::new(35.0, 240.0), true, 640, 480));
    }
}
