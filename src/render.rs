//! Turns a tick's hit-test report into draw instructions. Nothing here feeds
//! back into kick detection.

use crate::ball::{sprite_fits, sprite_size, Side, BALL_RADIUS, GLOW_HALO};
use crate::capture::Frame;
use crate::engine::TickReport;
use crate::error::Result;
use crate::geometry::Point;

pub const KNEE_MARKER_RADIUS: f64 = 14.0;

pub const LEFT_KNEE_COLOR: [u8; 3] = [0, 255, 0];
pub const RIGHT_KNEE_COLOR: [u8; 3] = [255, 0, 0];
pub const HALO_COLOR: [u8; 3] = [0, 255, 0];
pub const BALL_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallMarker {
    pub center: Point,
    pub radius: f64,
    pub glow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KneeMarkers {
    pub left: Point,
    pub right: Point,
    pub tracked: Side,
}

/// A frame with the game overlay drawn into its pixels, plus the overlay
/// geometry for renderers that draw their own shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub ball: Option<BallMarker>,
    pub knees: Option<KneeMarkers>,
}

impl AnnotatedFrame {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hud {
    pub time_left: u32,
    pub kicks: u32,
}

impl Hud {
    pub fn time_text(&self) -> String {
        format!("TIME: {}s", self.time_left)
    }

    pub fn kicks_text(&self) -> String {
        format!("KICKS: {}", self.kicks)
    }
}

/// Display boundary
pub trait Renderer {
    fn render(&mut self, frame: &AnnotatedFrame, hud: &Hud) -> Result<()>;
}

/// Keeps the last thing it was asked to draw. Used headless and in tests.
#[derive(Debug, Default)]
pub struct CapturingRenderer {
    pub frames: usize,
    pub last_frame: Option<AnnotatedFrame>,
    pub last_hud: Option<Hud>,
}

impl Renderer for CapturingRenderer {
    fn render(&mut self, frame: &AnnotatedFrame, hud: &Hud) -> Result<()> {
        self.frames += 1;
        self.last_frame = Some(frame.clone());
        self.last_hud = Some(*hud);
        Ok(())
    }
}

/// Outcome of annotating one frame. `ball_skipped` is set when the ball would
/// have been drawn outside the frame.
pub struct Annotation {
    pub frame: AnnotatedFrame,
    pub ball_skipped: bool,
}

pub fn annotate(mut frame: Frame, report: Option<&TickReport>) -> Annotation {
    let Some(report) = report else {
        return Annotation {
            frame: AnnotatedFrame {
                frame,
                ball: None,
                knees: None,
            },
            ball_skipped: false,
        };
    };

    fill_disc(&mut frame, report.left_knee, KNEE_MARKER_RADIUS, LEFT_KNEE_COLOR);
    fill_disc(&mut frame, report.right_knee, KNEE_MARKER_RADIUS, RIGHT_KNEE_COLOR);

    if report.glow {
        fill_disc(&mut frame, report.target, BALL_RADIUS + GLOW_HALO, HALO_COLOR);
    }

    let fits = sprite_fits(report.target, report.glow, frame.width, frame.height);
    let ball = fits.then(|| {
        let radius = sprite_size(report.glow) / 2.0;
        fill_disc(&mut frame, report.target, radius, BALL_COLOR);
        BallMarker {
            center: report.target,
            radius,
            glow: report.glow,
        }
    });

    Annotation {
        frame: AnnotatedFrame {
            frame,
            ball,
            knees: Some(KneeMarkers {
                left: report.left_knee,
                right: report.right_knee,
                tracked: report.tracked_side,
            }),
        },
        ball_skipped: !fits,
    }
}

/// Paints a filled circle, clipped to the frame.
pub fn fill_disc(frame: &mut Frame, center: Point, radius: f64, color: [u8; 3]) {
    if frame.width == 0 || frame.height == 0 {
        return;
    }
    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = (center.x + radius).ceil().min(frame.width as f64 - 1.0);
    let y1 = (center.y + radius).ceil().min(frame.height as f64 - 1.0);
    if x1 < 0.0 || y1 < 0.0 {
        return;
    }
    let r2 = radius * radius;
    for y in y0..=y1 as u32 {
        for x in x0..=x1 as u32 {
            let (dx, dy) = (x as f64 - center.x, y as f64 - center.y);
            if dx * dx + dy * dy <= r2 {
                let idx = (y as usize * frame.width as usize + x as usize) * 3;
                if let Some(px) = frame.pixels.get_mut(idx..idx + 3) {
                    px.copy_from_slice(&color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(target: Point, glow: bool) -> TickReport {
        TickReport {
            target,
            left_knee: Point::new(100.0, 300.0),
            right_knee: Point::new(200.0, 300.0),
            tracked_side: Side::Left,
            inside: false,
            glow,
            kick: None,
        }
    }

    #[test]
    fn test_annotate_without_report_passes_frame_through() {
        let frame = Frame::blank(3, 64, 48);
        let a = annotate(frame.clone(), None);
        assert_eq!(a.frame.frame, frame);
        assert!(a.frame.ball.is_none());
        assert!(a.frame.knees.is_none());
        assert!(!a.ball_skipped);
    }

    #[test]
    fn test_annotate_draws_ball_and_knees() {
        let a = annotate(Frame::blank(0, 640, 480), Some(&report(Point::new(320.0, 240.0), false)));

        let ball = a.frame.ball.unwrap();
        assert_eq!(ball.center, Point::new(320.0, 240.0));
        assert_eq!(ball.radius, 35.0);
        assert!(!a.ball_skipped);

        assert_eq!(a.frame.frame.pixel(320, 240), Some(BALL_COLOR));
        assert_eq!(a.frame.frame.pixel(100, 300), Some(LEFT_KNEE_COLOR));
        assert_eq!(a.frame.frame.pixel(200, 300), Some(RIGHT_KNEE_COLOR));
        assert_eq!(a.frame.frame.pixel(0, 0), Some([0, 0, 0]));
    }

    #[test]
    fn test_annotate_glow_draws_halo_ring() {
        let a = annotate(Frame::blank(0, 640, 480), Some(&report(Point::new(320.0, 240.0), true)));
        assert!(a.frame.ball.unwrap().glow);
        // inside the halo, outside the enlarged sprite
        assert_eq!(a.frame.frame.pixel(320 + 44, 240), Some(HALO_COLOR));
        assert_eq!(a.frame.frame.pixel(320, 240), Some(BALL_COLOR));
    }

    #[test]
    fn test_annotate_skips_ball_outside_frame() {
        let a = annotate(Frame::blank(0, 640, 480), Some(&report(Point::new(10.0, 240.0), false)));
        assert!(a.ball_skipped);
        assert!(a.frame.ball.is_none());
        assert!(a.frame.knees.is_some());
        assert_eq!(a.frame.frame.pixel(10, 240), Some([0, 0, 0]));
    }

    #[test]
    fn test_fill_disc_clips_at_edges() {
        let mut frame = Frame::blank(0, 10, 10);
        fill_disc(&mut frame, Point::new(-2.0, -2.0), 4.0, [9, 9, 9]);
        assert_eq!(frame.pixel(0, 0), Some([9, 9, 9]));
        assert_eq!(frame.pixel(5, 5), Some([0, 0, 0]));

        fill_disc(&mut frame, Point::new(-50.0, 5.0), 3.0, [1, 1, 1]);
        assert!(frame.pixels.iter().all(|&b| b == 0 || b == 9));
    }

    #[test]
    fn test_hud_text() {
        let hud = Hud {
            time_left: 27,
            kicks: 4,
        };
        assert_eq!(hud.time_text(), "TIME: 27s");
        assert_eq!(hud.kicks_text(), "KICKS: 4");
    }
}
